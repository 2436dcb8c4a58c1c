//! Error types for corrupted dataset generation.

use thiserror::Error;

/// Main error type for corrupted dataset generation.
#[derive(Error, Debug)]
pub enum Error {
    /// Corruption name outside the twelve known types
    #[error("Unknown corruption type: {0}")]
    UnknownCorruptionType(String),

    /// Severity outside 1..=5
    #[error("Invalid severity {0}: must be between 1 and 5")]
    InvalidSeverity(i64),

    /// Raw image bytes could not be decoded to an RGB image
    #[error("Failed to decode image '{file_name}': {reason}")]
    Decode { file_name: String, reason: String },

    /// Image could not be re-encoded
    #[error("Encoding error: {0}")]
    Encode(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid argument error
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Builds a decode error for the named example.
    pub fn decode(file_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::Decode {
            file_name: file_name.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Specialized Result type for corruption operations.
pub type Result<T> = std::result::Result<T, Error>;
