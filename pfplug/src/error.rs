//! Error types for pfplug
//!
//! Errors here are internal or environmental failures. Problems the user can
//! fix by editing configuration are reported as [`crate::types::Diagnostics`]
//! instead, so a whole validation pass can report all of them at once.

/// Error type for pfplug operations
#[derive(Debug, thiserror::Error)]
pub enum PfplugError {
    #[error("failed to parse product version '{input}': {reason}")]
    VersionParse { input: String, reason: String },

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Invalid version registry: {0}")]
    InvalidRegistry(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Failed to decode remote state at '{path}': {message}")]
    RemoteDecode { path: String, message: String },

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Resource type not found: {0}")]
    ResourceNotFound(String),

    #[error("Data source type not found: {0}")]
    DataSourceNotFound(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Custom(String),
}

/// Result type alias for pfplug operations
pub type Result<T> = std::result::Result<T, PfplugError>;

impl From<String> for PfplugError {
    fn from(s: String) -> Self {
        PfplugError::Custom(s)
    }
}

impl From<&str> for PfplugError {
    fn from(s: &str) -> Self {
        PfplugError::Custom(s.to_string())
    }
}

impl From<serde_json::Error> for PfplugError {
    fn from(e: serde_json::Error) -> Self {
        PfplugError::DecodingError(e.to_string())
    }
}
