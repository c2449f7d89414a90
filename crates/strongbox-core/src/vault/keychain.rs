//! Vault key hierarchy builder
//!
//! Trust flows one way through four tiers: the address key vouches for a
//! signing key, the signing key vouches for the vault key, and the vault
//! key protects the item key. The chain is built in that strict order;
//! each tier's passphrase is encrypted to the tier that guards it.

use crate::crypto::hybrid::{self, EncryptedMessage};
use crate::crypto::keypair::{LockedKeyPair, Passphrase, Signature, UnlockedKeyPair};
use crate::models::AddressKey;
use crate::{Error, Result};

/// Freshly generated key material for one vault, consumed while building
/// the creation request and discarded afterwards. Passphrases zeroize on
/// drop; nothing in here is ever cached or logged.
pub struct VaultKeyChain {
    /// Signing key delegating trust from the address key
    pub signing_key: LockedKeyPair,
    /// Passphrase unlocking the signing key
    pub signing_key_passphrase: Passphrase,
    /// Signing-key passphrase encrypted to the address key
    pub signing_key_passphrase_packets: EncryptedMessage,
    /// Address-key signature over the signing key's fingerprint
    pub acceptance_signature: Signature,

    /// Key securing the vault's content
    pub vault_key: LockedKeyPair,
    /// Passphrase unlocking the vault key
    pub vault_key_passphrase: Passphrase,
    /// Vault-key passphrase encrypted to the address key
    pub vault_key_passphrase_packets: EncryptedMessage,
    /// Signing-key signature over the vault key's fingerprint
    pub vault_key_signature: Signature,

    /// Key securing individual item payloads
    pub item_key: LockedKeyPair,
    /// Passphrase unlocking the item key
    pub item_key_passphrase: Passphrase,
    /// Item-key passphrase encrypted to the vault key
    pub item_key_passphrase_packets: EncryptedMessage,
    /// Signing-key signature over the item key's fingerprint
    pub item_key_signature: Signature,
}

/// Vault content encrypted and signed for transmission
pub struct SealedVaultContent {
    /// Content ciphertext addressed to the vault key, combined packets
    pub encrypted_content: Vec<u8>,
    /// Address-key signature over the plaintext, encrypted under the vault key
    pub encrypted_address_signature: Vec<u8>,
    /// Vault-key signature over the plaintext, encrypted under the vault key
    pub encrypted_vault_signature: Vec<u8>,
    /// Vault-key signature over the vault passphrase key packet
    pub key_packet_signature: Signature,
}

impl VaultKeyChain {
    /// Build the full key hierarchy for a new vault.
    ///
    /// Any failure aborts the whole build; no partial material is returned.
    pub fn generate(address_key: &AddressKey) -> Result<Self> {
        let address = address_key
            .unlock()
            .map_err(|e| stage_error("unlock address key", e))?;
        let address_public = address_key.key.public();

        // Tier 1: signing key, vouched for by the address key
        let (signing_key, signing_key_passphrase) =
            LockedKeyPair::generate().map_err(|e| stage_error("generate signing key", e))?;
        let signing_key_passphrase_packets =
            hybrid::encrypt_for_recipient(address_public, signing_key_passphrase.as_bytes())
                .map_err(|e| stage_error("encrypt signing key passphrase", e))?;
        let acceptance_signature =
            address.sign_detached(signing_key.public().fingerprint().as_bytes());

        let signing = signing_key
            .unlock(&signing_key_passphrase)
            .map_err(|e| stage_error("unlock signing key", e))?;

        // Tier 2: vault key, vouched for by the signing key
        let (vault_key, vault_key_passphrase) =
            LockedKeyPair::generate().map_err(|e| stage_error("generate vault key", e))?;
        let vault_key_passphrase_packets =
            hybrid::encrypt_for_recipient(address_public, vault_key_passphrase.as_bytes())
                .map_err(|e| stage_error("encrypt vault key passphrase", e))?;
        let vault_key_signature = signing.sign_detached(vault_key.public().fingerprint().as_bytes());

        // Tier 3: item key, protected by the vault key
        let (item_key, item_key_passphrase) =
            LockedKeyPair::generate().map_err(|e| stage_error("generate item key", e))?;
        let item_key_passphrase_packets =
            hybrid::encrypt_for_recipient(vault_key.public(), item_key_passphrase.as_bytes())
                .map_err(|e| stage_error("encrypt item key passphrase", e))?;
        let item_key_signature = signing.sign_detached(item_key.public().fingerprint().as_bytes());

        Ok(Self {
            signing_key,
            signing_key_passphrase,
            signing_key_passphrase_packets,
            acceptance_signature,
            vault_key,
            vault_key_passphrase,
            vault_key_passphrase_packets,
            vault_key_signature,
            item_key,
            item_key_passphrase,
            item_key_passphrase_packets,
            item_key_signature,
        })
    }

    /// Encrypt and dual-sign the plaintext vault content.
    ///
    /// Both signatures cover the identical plaintext bytes: the address key
    /// proves authorship, the vault key proves custody. The signatures are
    /// themselves encrypted under the vault key; they only become
    /// verifiable after a member decrypts them.
    pub fn seal_content(
        &self,
        address_key: &AddressKey,
        content_bytes: &[u8],
    ) -> Result<SealedVaultContent> {
        let address = address_key
            .unlock()
            .map_err(|e| stage_error("unlock address key", e))?;
        let vault = self
            .vault_key
            .unlock(&self.vault_key_passphrase)
            .map_err(|e| stage_error("unlock vault key", e))?;
        let vault_public = self.vault_key.public();

        let encrypted_content = hybrid::encrypt_for_recipient(vault_public, content_bytes)
            .map_err(|e| stage_error("encrypt vault content", e))?
            .to_combined();

        let address_signature = address.sign_detached(content_bytes);
        let vault_signature = vault.sign_detached(content_bytes);

        let encrypted_address_signature =
            hybrid::encrypt_for_recipient(vault_public, address_signature.as_bytes())
                .map_err(|e| stage_error("encrypt address signature", e))?
                .to_combined();
        let encrypted_vault_signature =
            hybrid::encrypt_for_recipient(vault_public, vault_signature.as_bytes())
                .map_err(|e| stage_error("encrypt vault signature", e))?
                .to_combined();

        let key_packet_signature =
            vault.sign_detached(&self.vault_key_passphrase_packets.key_packet);

        Ok(SealedVaultContent {
            encrypted_content,
            encrypted_address_signature,
            encrypted_vault_signature,
            key_packet_signature,
        })
    }

    /// Unlock the vault key (used by tests and by decryption paths)
    pub fn unlock_vault_key(&self) -> Result<UnlockedKeyPair> {
        self.vault_key.unlock(&self.vault_key_passphrase)
    }
}

fn stage_error(stage: &str, source: Error) -> Error {
    Error::KeyGeneration(format!("{stage}: {source}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hybrid;
    use crate::crypto::keypair::Passphrase;

    #[test]
    fn test_vault_key_signed_by_signing_key_not_address_key() {
        let address_key = AddressKey::generate("address-1").unwrap();
        let chain = VaultKeyChain::generate(&address_key).unwrap();

        let fingerprint = chain.vault_key.public().fingerprint();
        chain
            .signing_key
            .public()
            .verify_detached(fingerprint.as_bytes(), &chain.vault_key_signature)
            .unwrap();
        assert!(address_key
            .key
            .public()
            .verify_detached(fingerprint.as_bytes(), &chain.vault_key_signature)
            .is_err());
    }

    #[test]
    fn test_item_key_signed_by_signing_key_not_address_key() {
        let address_key = AddressKey::generate("address-1").unwrap();
        let chain = VaultKeyChain::generate(&address_key).unwrap();

        let fingerprint = chain.item_key.public().fingerprint();
        chain
            .signing_key
            .public()
            .verify_detached(fingerprint.as_bytes(), &chain.item_key_signature)
            .unwrap();
        assert!(address_key
            .key
            .public()
            .verify_detached(fingerprint.as_bytes(), &chain.item_key_signature)
            .is_err());
    }

    #[test]
    fn test_signing_key_accepted_by_address_key() {
        let address_key = AddressKey::generate("address-1").unwrap();
        let chain = VaultKeyChain::generate(&address_key).unwrap();

        let fingerprint = chain.signing_key.public().fingerprint();
        address_key
            .key
            .public()
            .verify_detached(fingerprint.as_bytes(), &chain.acceptance_signature)
            .unwrap();
    }

    #[test]
    fn test_passphrases_recoverable_through_the_hierarchy() {
        let address_key = AddressKey::generate("address-1").unwrap();
        let chain = VaultKeyChain::generate(&address_key).unwrap();
        let address = address_key.unlock().unwrap();

        // Vault passphrase decrypts with the address key
        let vault_passphrase =
            hybrid::decrypt(&address, &chain.vault_key_passphrase_packets).unwrap();
        assert_eq!(vault_passphrase, chain.vault_key_passphrase.as_bytes());

        // Item passphrase decrypts with the vault key, not the address key
        let vault = chain
            .vault_key
            .unlock(&Passphrase::new(
                String::from_utf8(vault_passphrase).unwrap(),
            ))
            .unwrap();
        let item_passphrase = hybrid::decrypt(&vault, &chain.item_key_passphrase_packets).unwrap();
        assert_eq!(item_passphrase, chain.item_key_passphrase.as_bytes());
        assert!(hybrid::decrypt(&address, &chain.item_key_passphrase_packets).is_err());
    }

    #[test]
    fn test_content_dual_signatures_verify_after_decryption() {
        let address_key = AddressKey::generate("address-1").unwrap();
        let chain = VaultKeyChain::generate(&address_key).unwrap();

        let content = b"vault content plaintext";
        let sealed = chain.seal_content(&address_key, content).unwrap();
        let vault = chain.unlock_vault_key().unwrap();

        let decrypted = hybrid::decrypt(
            &vault,
            &hybrid::EncryptedMessage::from_combined(&sealed.encrypted_content).unwrap(),
        )
        .unwrap();
        assert_eq!(decrypted, content);

        let address_signature = Signature::from_slice(
            &hybrid::decrypt(
                &vault,
                &hybrid::EncryptedMessage::from_combined(&sealed.encrypted_address_signature)
                    .unwrap(),
            )
            .unwrap(),
        )
        .unwrap();
        address_key
            .key
            .public()
            .verify_detached(content, &address_signature)
            .unwrap();

        let vault_signature = Signature::from_slice(
            &hybrid::decrypt(
                &vault,
                &hybrid::EncryptedMessage::from_combined(&sealed.encrypted_vault_signature)
                    .unwrap(),
            )
            .unwrap(),
        )
        .unwrap();
        chain
            .vault_key
            .public()
            .verify_detached(content, &vault_signature)
            .unwrap();
    }

    #[test]
    fn test_key_packet_signature_verifies_against_vault_key() {
        let address_key = AddressKey::generate("address-1").unwrap();
        let chain = VaultKeyChain::generate(&address_key).unwrap();
        let sealed = chain.seal_content(&address_key, b"content").unwrap();

        chain
            .vault_key
            .public()
            .verify_detached(
                &chain.vault_key_passphrase_packets.key_packet,
                &sealed.key_packet_signature,
            )
            .unwrap();
    }
}
