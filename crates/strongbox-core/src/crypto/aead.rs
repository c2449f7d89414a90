//! Authenticated symmetric encryption
//!
//! AES-256-GCM with a random nonce prepended to the ciphertext. The
//! associated-data tag scopes a ciphertext to one content type so that a
//! blob encrypted as, say, item content can never be replayed as vault
//! content.

use crate::{Error, Result};
use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use zeroize::Zeroizing;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Smallest valid combined ciphertext: nonce plus authentication tag.
pub const MIN_CIPHERTEXT_LEN: usize = NONCE_LEN + TAG_LEN;

/// Associated-data tag for vault content ciphertexts
pub const VAULT_CONTENT_AAD: &[u8] = b"vaultcontent";

/// Associated-data tag for item content ciphertexts
pub const ITEM_CONTENT_AAD: &[u8] = b"itemcontent";

/// Generate a fresh 256-bit key
pub fn generate_key() -> Zeroizing<[u8; 32]> {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    Zeroizing::new(key)
}

/// Encrypt with a random nonce; output is `nonce || ciphertext || tag`
pub fn encrypt(key: &[u8; 32], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.into());

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|e| Error::Encryption(e.to_string()))?;

    let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Encrypt with a caller-provided nonce.
///
/// Only valid when the key is never reused, e.g. wrapping a session key
/// under a freshly derived wrap key.
pub fn encrypt_with_nonce(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.into());
    cipher
        .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
        .map_err(|e| Error::Encryption(e.to_string()))
}

/// Decrypt a `nonce || ciphertext || tag` blob
pub fn decrypt(key: &[u8; 32], data: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    if data.len() < MIN_CIPHERTEXT_LEN {
        return Err(Error::Decryption("Ciphertext too short".to_string()));
    }
    let cipher = Aes256Gcm::new(key.into());
    let nonce = Nonce::from_slice(&data[..NONCE_LEN]);
    cipher
        .decrypt(nonce, Payload { msg: &data[NONCE_LEN..], aad })
        .map_err(|e| Error::Decryption(e.to_string()))
}

/// Decrypt a ciphertext produced by [`encrypt_with_nonce`]
pub fn decrypt_with_nonce(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    data: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.into());
    cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg: data, aad })
        .map_err(|e| Error::Decryption(e.to_string()))
}
