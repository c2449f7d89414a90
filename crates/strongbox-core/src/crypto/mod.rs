//! Cryptographic engine
//!
//! Composes the primitives the vault engine needs: authenticated symmetric
//! encryption, passphrase-locked dual keypairs (signing + key exchange),
//! and hybrid encrypt-for-recipient with the key-packet/data-packet split.

pub mod aead;
pub mod hybrid;
pub mod keypair;

pub use aead::MIN_CIPHERTEXT_LEN;
pub use hybrid::EncryptedMessage;
pub use keypair::{LockedKeyPair, Passphrase, PublicKey, Signature, UnlockedKeyPair};
