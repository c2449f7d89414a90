//! Error types

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Field encryption error
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// A bulk write failed; the whole batch was rolled back
    #[error("Batch insert error: {0}")]
    BatchInsert(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value failed validation on read
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
