//! Error types for the classplan core.

use thiserror::Error;

/// Errors that can occur while talking to the section catalog.
#[derive(Error, Debug)]
pub enum ClassplanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Catalog returned status {status} for '{uri}'")]
    Status { uri: String, status: u16 },

    #[error("Could not decode response from '{uri}': {source}")]
    Decode {
        uri: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Catalog request timed out after {0}s")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid color '{0}'. Expected #rgb or #rrggbb")]
    InvalidColor(String),

    #[error("Invalid color key '{0}'. Expected <kind>-<id>, e.g. subject-12")]
    InvalidColorKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for classplan operations.
pub type ClassplanResult<T> = Result<T, ClassplanError>;
