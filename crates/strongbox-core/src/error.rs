//! Error types for the vault engine core

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Core errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A step of the key hierarchy build failed
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// Armoring, base64 or fingerprint extraction failed after key generation
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Symmetric encryption produced an invalid or undersized result
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Ciphertext could not be decrypted or authenticated
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Signature creation or verification failed
    #[error("Signature error: {0}")]
    Signature(String),

    /// Invalid key material
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// No vault matches the object's share id
    #[error("Vault not found for share {0}")]
    VaultNotFound(String),

    /// Content payload decoding error
    #[error("Content decode error: {0}")]
    ContentDecode(#[from] prost::DecodeError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
