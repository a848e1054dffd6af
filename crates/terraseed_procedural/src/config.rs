//! # Generator Configuration
//!
//! TOML-backed settings for synthesis and verification. Every field has a
//! default, so an empty file is a valid configuration:
//!
//! ```toml
//! grid_size = 64
//! verification_runs = 3
//! mapping = "v2"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProceduralResult;
use crate::key::MappingVersion;
use crate::link::ShareLink;
use crate::synth::{DEFAULT_GRID_SIZE, MAX_GRID_SIZE, MIN_GRID_SIZE};

/// Fewest runs the determinism verifier accepts.
pub const MIN_VERIFICATION_RUNS: u32 = 3;

/// Generator settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Grid edge length in cells.
    pub grid_size: usize,
    /// Synthesis runs per determinism check.
    pub verification_runs: u32,
    /// Mapping version for links that name none.
    pub mapping: MappingVersion,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            verification_runs: MIN_VERIFICATION_RUNS,
            mapping: MappingVersion::CURRENT,
        }
    }
}

impl GeneratorConfig {
    /// Decodes a shareable link, falling back to the configured mapping
    /// version when the link names none or an unknown one.
    #[must_use]
    pub fn open_link(&self, text: &str) -> ShareLink {
        ShareLink::decode_or(text, self.mapping)
    }

    /// Parses configuration from TOML text. Out-of-range values are clamped.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProceduralError::Config`] if the text is not valid
    /// TOML or a field has the wrong type.
    pub fn from_toml_str(text: &str) -> ProceduralResult<Self> {
        let config: Self = toml::from_str(text)?;
        Ok(config.normalized())
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> ProceduralResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Clamps every field into its supported range.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.grid_size = self.grid_size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE);
        self.verification_runs = self.verification_runs.max(MIN_VERIFICATION_RUNS);
        self
    }
}
