//! # Streaming Error Types
//!
//! Cache errors are `Clone`: one failed build is fanned out to every
//! caller that was waiting on it.

use terraseed_procedural::GenerationKey;
use thiserror::Error;

/// Why `ensure_ready` could not produce an artifact.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The builder returned an error.
    #[error("build failed for {key}: {reason}")]
    BuildFailed {
        /// Key being built.
        key: GenerationKey,
        /// Builder's message.
        reason: String,
    },

    /// The builder panicked.
    #[error("build panicked for {key}")]
    BuildPanicked {
        /// Key being built.
        key: GenerationKey,
    },

    /// The build task went away without a result, usually at runtime shutdown.
    #[error("build abandoned for {key}")]
    BuildAbandoned {
        /// Key being built.
        key: GenerationKey,
    },
}

impl CacheError {
    /// Key the failed build was for.
    #[must_use]
    pub const fn key(&self) -> &GenerationKey {
        match self {
            Self::BuildFailed { key, .. }
            | Self::BuildPanicked { key }
            | Self::BuildAbandoned { key } => key,
        }
    }
}

/// Error a [`crate::RegionBuilder`] reports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct BuildError {
    reason: String,
}

impl BuildError {
    /// Creates a build error.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    /// The message.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Why a parameter lookup failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The source could not answer.
    #[error("parameter source unavailable: {0}")]
    Unavailable(String),

    /// The source did not answer in time.
    #[error("parameter lookup timed out")]
    TimedOut,
}

/// Why entering a region failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnterError {
    /// Parameters for the region could not be resolved.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The region's artifact could not be built.
    #[error(transparent)]
    Build(#[from] CacheError),
}

/// Errors from loading streaming configuration.
#[derive(Error, Debug)]
pub enum StreamingError {
    /// Configuration text is not valid TOML for the expected shape.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Reading a file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for streaming configuration.
pub type StreamingResult<T> = Result<T, StreamingError>;
