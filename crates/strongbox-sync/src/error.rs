//! Error types for sync operations

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Sync errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Server-provided message, if any
        message: String,
    },

    /// HTTP transport error
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response did not match the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A share has no key material even after a forced refresh
    #[error("No share keys for share {0}")]
    NoShareKeys(String),

    /// A concurrent fetch task failed to join
    #[error("Task join error: {0}")]
    Join(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] strongbox_storage_sqlite::Error),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] strongbox_core::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
