//! Error types

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Autofill errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Credential ranking was invoked on a non-login item
    #[error("Not a login item")]
    NotLoginItem,

    /// A recognized OS request carried the wrong identity payload
    #[error("Unexpected request payload: {0}")]
    UnexpectedPayload(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] strongbox_storage_sqlite::Error),
}
