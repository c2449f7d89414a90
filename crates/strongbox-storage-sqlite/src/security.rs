//! Field-level encryption
//!
//! Sensitive columns (vault content, share key material) are sealed with a
//! session-scoped master key before insertion. The master key comes from
//! the platform session layer and is already high entropy; no passphrase
//! KDF is involved at this level.

use crate::{Error, Result};
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;
use zeroize::Zeroizing;

const FORMAT_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const HEADER_LEN: usize = 2 + NONCE_LEN;

/// Encryption algorithm for field sealing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionAlgorithm {
    /// AES-256-GCM
    AesGcm,
    /// ChaCha20-Poly1305
    ChaCha20Poly1305,
}

impl EncryptionAlgorithm {
    fn id(self) -> u8 {
        match self {
            Self::AesGcm => 0,
            Self::ChaCha20Poly1305 => 1,
        }
    }

    fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Self::AesGcm),
            1 => Ok(Self::ChaCha20Poly1305),
            other => Err(Error::Encryption(format!("Unknown algorithm id: {other}"))),
        }
    }
}

/// Master key for field-level encryption
#[derive(Clone)]
pub struct MasterKey {
    key: Zeroizing<[u8; 32]>,
    algorithm: EncryptionAlgorithm,
}

impl MasterKey {
    /// Generate a new random master key
    pub fn generate(algorithm: EncryptionAlgorithm) -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self {
            key: Zeroizing::new(key),
            algorithm,
        }
    }

    /// Create from raw bytes handed over by the session layer
    pub fn from_bytes(bytes: &[u8], algorithm: EncryptionAlgorithm) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(Error::Encryption("Invalid key length".to_string()));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);
        Ok(Self {
            key: Zeroizing::new(key),
            algorithm,
        })
    }

    /// Encrypt a field value.
    ///
    /// Output format: `[version(1)][algorithm(1)][nonce(12)][ciphertext]`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = match self.algorithm {
            EncryptionAlgorithm::AesGcm => {
                let cipher = Aes256Gcm::new(self.key.as_ref().into());
                cipher
                    .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
                    .map_err(|e| Error::Encryption(e.to_string()))?
            }
            EncryptionAlgorithm::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new(self.key.as_ref().into());
                cipher
                    .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
                    .map_err(|e| Error::Encryption(e.to_string()))?
            }
        };

        let mut result = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        result.push(FORMAT_VERSION);
        result.push(self.algorithm.id());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    /// Decrypt a field value
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() < HEADER_LEN {
            return Err(Error::Encryption("Invalid ciphertext length".to_string()));
        }
        if data[0] != FORMAT_VERSION {
            return Err(Error::Encryption(format!(
                "Unsupported encryption version: {}",
                data[0]
            )));
        }
        let algorithm = EncryptionAlgorithm::from_id(data[1])?;
        if algorithm != self.algorithm {
            return Err(Error::Encryption(format!(
                "Algorithm mismatch: expected {:?}, got {:?}",
                self.algorithm, algorithm
            )));
        }

        let nonce = Nonce::from_slice(&data[2..HEADER_LEN]);
        let ciphertext = &data[HEADER_LEN..];
        match algorithm {
            EncryptionAlgorithm::AesGcm => {
                let cipher = Aes256Gcm::new(self.key.as_ref().into());
                cipher
                    .decrypt(nonce, ciphertext)
                    .map_err(|e| Error::Encryption(e.to_string()))
            }
            EncryptionAlgorithm::ChaCha20Poly1305 => {
                let cipher = ChaCha20Poly1305::new(self.key.as_ref().into());
                cipher
                    .decrypt(nonce, ciphertext)
                    .map_err(|e| Error::Encryption(e.to_string()))
            }
        }
    }

    /// Encrypt a string field
    pub fn encrypt_string(&self, value: &str) -> Result<Vec<u8>> {
        self.encrypt(value.as_bytes())
    }

    /// Decrypt a string field
    pub fn decrypt_string(&self, data: &[u8]) -> Result<String> {
        let plaintext = self.decrypt(data)?;
        String::from_utf8(plaintext)
            .map_err(|e| Error::Encryption(format!("Failed to decode string: {e}")))
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_aes_gcm() {
        let key = MasterKey::generate(EncryptionAlgorithm::AesGcm);
        let ciphertext = key.encrypt(b"share content").unwrap();
        assert_eq!(key.decrypt(&ciphertext).unwrap(), b"share content");
    }

    #[test]
    fn test_round_trip_chacha20() {
        let key = MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305);
        let ciphertext = key.encrypt(b"share content").unwrap();
        assert_eq!(key.decrypt(&ciphertext).unwrap(), b"share content");
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = MasterKey::generate(EncryptionAlgorithm::AesGcm);
        let other = MasterKey::generate(EncryptionAlgorithm::AesGcm);
        let ciphertext = key.encrypt(b"secret").unwrap();
        assert!(other.decrypt(&ciphertext).is_err());
    }

    #[test]
    fn test_algorithm_mismatch_rejected() {
        let aes = MasterKey::generate(EncryptionAlgorithm::AesGcm);
        let ciphertext = aes.encrypt(b"secret").unwrap();

        let chacha = MasterKey::from_bytes(aes.key.as_ref(), EncryptionAlgorithm::ChaCha20Poly1305)
            .unwrap();
        assert!(chacha.decrypt(&ciphertext).is_err());
    }

    #[test]
    fn test_string_round_trip() {
        let key = MasterKey::generate(EncryptionAlgorithm::AesGcm);
        let ciphertext = key.encrypt_string("user@example.com").unwrap();
        assert_eq!(key.decrypt_string(&ciphertext).unwrap(), "user@example.com");
    }
}
