//! # Procedural Error Types
//!
//! Generation itself is total: out-of-range input is clamped, never
//! rejected. Errors only come from the edges of the crate, loading
//! configuration and decoding packed artifacts.

use thiserror::Error;

/// Errors from configuration and artifact decoding.
#[derive(Error, Debug)]
pub enum ProceduralError {
    /// Configuration text is not valid TOML for the expected shape.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Reading a file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// LZ4 payload could not be decompressed.
    #[error("decompression failed: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),

    /// Decoded bytes do not describe a valid artifact.
    #[error("corrupt artifact: {reason}")]
    CorruptArtifact {
        /// What was wrong.
        reason: String,
    },
}

impl ProceduralError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptArtifact { reason: reason.into() }
    }
}

/// Result type for procedural operations.
pub type ProceduralResult<T> = Result<T, ProceduralError>;
