//! # Cache Configuration
//!
//! ```toml
//! byte_budget = 67108864
//! lookup_timeout_ms = 2000
//! ```
//!
//! Omitting `lookup_timeout_ms` keeps the default; there is no way to
//! spell "no timeout" in TOML other than constructing the struct directly.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StreamingResult;

/// Default resident byte budget: 64 MiB.
pub const DEFAULT_BYTE_BUDGET: usize = 64 * 1024 * 1024;

/// Default parameter lookup timeout.
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 2000;

/// Region cache settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Soft cap on resident artifact bytes.
    pub byte_budget: usize,
    /// Timeout for neighbour parameter lookups, `None` to wait indefinitely.
    pub lookup_timeout_ms: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            byte_budget: DEFAULT_BYTE_BUDGET,
            lookup_timeout_ms: Some(DEFAULT_LOOKUP_TIMEOUT_MS),
        }
    }
}

impl CacheConfig {
    /// Config with a byte budget and default timeout.
    #[must_use]
    pub fn with_budget(byte_budget: usize) -> Self {
        Self {
            byte_budget,
            ..Self::default()
        }
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StreamingError::Config`] on malformed TOML.
    pub fn from_toml_str(text: &str) -> StreamingResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> StreamingResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Lookup timeout as a duration.
    #[must_use]
    pub fn lookup_timeout(&self) -> Option<Duration> {
        self.lookup_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::from_toml_str("").unwrap();
        assert_eq!(config.byte_budget, 64 * 1024 * 1024);
        assert_eq!(config.lookup_timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_override() {
        let config =
            CacheConfig::from_toml_str("byte_budget = 1024\nlookup_timeout_ms = 50").unwrap();
        assert_eq!(config, CacheConfig { byte_budget: 1024, lookup_timeout_ms: Some(50) });
    }

    #[test]
    fn test_malformed() {
        assert!(CacheConfig::from_toml_str("byte_budget = -1").is_err());
    }
}
