//! Hybrid encrypt-for-recipient
//!
//! Ephemeral X25519 Diffie-Hellman wraps a fresh session key; the session
//! key encrypts the payload. The result is carried as two packets: a small
//! key packet (ephemeral public key plus the wrapped session key) and a
//! data packet (the payload ciphertext). The server can store and forward
//! the key packet independently, which is how share access is later granted
//! to invited members.

use crate::{Error, Result};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey as ExchangePublicKey};
use zeroize::Zeroizing;

use super::aead;
use super::keypair::{PublicKey, UnlockedKeyPair};

const WRAP_INFO: &[u8] = b"strongbox-session-wrap-v1";
const WRAP_AAD: &[u8] = b"strongbox-keywrap";
const DATA_AAD: &[u8] = b"strongbox-message";

/// Fixed zero nonce for session-key wrapping; safe because every wrap key
/// is derived from a fresh ephemeral exchange.
const WRAP_NONCE: [u8; 12] = [0u8; 12];

const EPHEMERAL_LEN: usize = 32;
const WRAPPED_KEY_LEN: usize = 48;

/// Length of the key packet: ephemeral public key plus wrapped session key
pub const KEY_PACKET_LEN: usize = EPHEMERAL_LEN + WRAPPED_KEY_LEN;

/// A hybrid-encrypted message split into its two packets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedMessage {
    /// Ephemeral public key and wrapped session key
    pub key_packet: Vec<u8>,
    /// Payload ciphertext under the session key
    pub data_packet: Vec<u8>,
}

impl EncryptedMessage {
    /// Concatenate the packets for transmission as one blob
    pub fn to_combined(&self) -> Vec<u8> {
        let mut combined = Vec::with_capacity(self.key_packet.len() + self.data_packet.len());
        combined.extend_from_slice(&self.key_packet);
        combined.extend_from_slice(&self.data_packet);
        combined
    }

    /// Split a combined blob back into its packets
    pub fn from_combined(combined: &[u8]) -> Result<Self> {
        if combined.len() <= KEY_PACKET_LEN {
            return Err(Error::Decryption("Combined message too short".to_string()));
        }
        Ok(Self {
            key_packet: combined[..KEY_PACKET_LEN].to_vec(),
            data_packet: combined[KEY_PACKET_LEN..].to_vec(),
        })
    }
}

/// Encrypt `plaintext` so only the holder of `recipient`'s private key can
/// read it.
pub fn encrypt_for_recipient(recipient: &PublicKey, plaintext: &[u8]) -> Result<EncryptedMessage> {
    let session_key = aead::generate_key();

    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = ExchangePublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(recipient.exchange());

    let wrap_key = derive_wrap_key(shared.as_bytes())?;
    let wrapped = aead::encrypt_with_nonce(&wrap_key, &WRAP_NONCE, session_key.as_ref(), WRAP_AAD)?;

    let mut key_packet = Vec::with_capacity(KEY_PACKET_LEN);
    key_packet.extend_from_slice(ephemeral_public.as_bytes());
    key_packet.extend_from_slice(&wrapped);

    let data_packet = aead::encrypt(&session_key, plaintext, DATA_AAD)?;

    Ok(EncryptedMessage {
        key_packet,
        data_packet,
    })
}

/// Decrypt a message addressed to `recipient`
pub fn decrypt(recipient: &UnlockedKeyPair, message: &EncryptedMessage) -> Result<Vec<u8>> {
    if message.key_packet.len() != KEY_PACKET_LEN {
        return Err(Error::Decryption(format!(
            "Invalid key packet length: {}",
            message.key_packet.len()
        )));
    }
    let ephemeral_bytes: [u8; EPHEMERAL_LEN] = message.key_packet[..EPHEMERAL_LEN]
        .try_into()
        .expect("length checked");
    let ephemeral_public = ExchangePublicKey::from(ephemeral_bytes);

    let shared = recipient.exchange_secret().diffie_hellman(&ephemeral_public);
    let wrap_key = derive_wrap_key(shared.as_bytes())?;

    let session_key_bytes = Zeroizing::new(aead::decrypt_with_nonce(
        &wrap_key,
        &WRAP_NONCE,
        &message.key_packet[EPHEMERAL_LEN..],
        WRAP_AAD,
    )?);
    let session_key: [u8; 32] = session_key_bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::Decryption("Unwrapped session key is not 32 bytes".to_string()))?;

    aead::decrypt(&session_key, &message.data_packet, DATA_AAD)
}

fn derive_wrap_key(shared_secret: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    let hkdf = Hkdf::<Sha256>::new(None, shared_secret);
    let mut key = Zeroizing::new([0u8; 32]);
    hkdf.expand(WRAP_INFO, key.as_mut())
        .map_err(|e| Error::Encryption(format!("Wrap key derivation failed: {e}")))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keypair::LockedKeyPair;

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let (recipient, passphrase) = LockedKeyPair::generate().unwrap();
        let message = encrypt_for_recipient(recipient.public(), b"vault passphrase").unwrap();
        assert_eq!(message.key_packet.len(), KEY_PACKET_LEN);

        let unlocked = recipient.unlock(&passphrase).unwrap();
        let plaintext = decrypt(&unlocked, &message).unwrap();
        assert_eq!(plaintext, b"vault passphrase");
    }

    #[test]
    fn test_wrong_recipient_fails() {
        let (recipient, _) = LockedKeyPair::generate().unwrap();
        let (other, other_passphrase) = LockedKeyPair::generate().unwrap();

        let message = encrypt_for_recipient(recipient.public(), b"secret").unwrap();
        let unlocked = other.unlock(&other_passphrase).unwrap();
        assert!(decrypt(&unlocked, &message).is_err());
    }

    #[test]
    fn test_combined_round_trip() {
        let (recipient, passphrase) = LockedKeyPair::generate().unwrap();
        let message = encrypt_for_recipient(recipient.public(), b"payload").unwrap();

        let combined = message.to_combined();
        let split = EncryptedMessage::from_combined(&combined).unwrap();
        assert_eq!(split, message);

        let unlocked = recipient.unlock(&passphrase).unwrap();
        assert_eq!(decrypt(&unlocked, &split).unwrap(), b"payload");
    }

    #[test]
    fn test_tampered_key_packet_fails() {
        let (recipient, passphrase) = LockedKeyPair::generate().unwrap();
        let mut message = encrypt_for_recipient(recipient.public(), b"secret").unwrap();
        message.key_packet[40] ^= 0xff;

        let unlocked = recipient.unlock(&passphrase).unwrap();
        assert!(decrypt(&unlocked, &message).is_err());
    }
}
