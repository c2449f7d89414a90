//! Encrypted request bodies for vault and item endpoints
//!
//! The codecs here are the last stop before the network: they assemble the
//! key hierarchy output into the documented wire fields and apply cheap
//! local sanity checks so a broken key chain is caught before the request
//! leaves the device.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;

use crate::crypto::aead;
use crate::models::{AddressKey, ShareKeyMaterial};
use crate::vault::content::{VaultContent, CONTENT_FORMAT_VERSION};
use crate::vault::keychain::VaultKeyChain;
use crate::{Error, Result};

/// Shortest plausible encoded content or signature field. Anything below
/// this is a corrupt or empty artifact, not a real ciphertext.
const MIN_ENCODED_LEN: usize = 28;

/// Vault creation request body
#[derive(Debug, Clone, Serialize)]
pub struct CreateVaultRequest {
    /// Address performing the creation
    #[serde(rename = "AddressID")]
    pub address_id: String,
    /// Encrypted vault content, base64
    #[serde(rename = "Content")]
    pub content: String,
    /// Content payload format version
    #[serde(rename = "ContentFormatVersion")]
    pub content_format_version: u32,
    /// Address-key signature over the content, encrypted under the vault key
    #[serde(rename = "ContentEncryptedAddressSignature")]
    pub content_encrypted_address_signature: String,
    /// Vault-key signature over the content, encrypted under the vault key
    #[serde(rename = "ContentEncryptedVaultSignature")]
    pub content_encrypted_vault_signature: String,
    /// Armored vault key locked with the passphrase below
    #[serde(rename = "VaultKey")]
    pub vault_key: String,
    /// Encrypted vault-key passphrase, data packet, base64
    #[serde(rename = "VaultKeyPassphrase")]
    pub vault_key_passphrase: String,
    /// Signing-key signature over the vault key fingerprint, base64
    #[serde(rename = "VaultKeySignature")]
    pub vault_key_signature: String,
    /// Session-key packet for the vault passphrase, base64
    #[serde(rename = "KeyPacket")]
    pub key_packet: String,
    /// Vault-key signature over the raw key packet, base64
    #[serde(rename = "KeyPacketSignature")]
    pub key_packet_signature: String,
    /// Armored signing key locked with the passphrase below
    #[serde(rename = "SigningKey")]
    pub signing_key: String,
    /// Encrypted signing-key passphrase, data packet, base64
    #[serde(rename = "SigningKeyPassphrase")]
    pub signing_key_passphrase: String,
    /// Session-key packet for the signing-key passphrase, base64
    #[serde(rename = "SigningKeyPassphraseKeyPacket")]
    pub signing_key_passphrase_key_packet: String,
    /// Address-key signature over the signing key fingerprint, base64
    #[serde(rename = "AcceptanceSignature")]
    pub acceptance_signature: String,
    /// Armored item key locked with the passphrase below
    #[serde(rename = "ItemKey")]
    pub item_key: String,
    /// Encrypted item-key passphrase, data packet, base64
    #[serde(rename = "ItemKeyPassphrase")]
    pub item_key_passphrase: String,
    /// Session-key packet for the item-key passphrase, base64
    #[serde(rename = "ItemKeyPassphraseKeyPacket")]
    pub item_key_passphrase_key_packet: String,
    /// Signing-key signature over the item key fingerprint, base64
    #[serde(rename = "ItemKeySignature")]
    pub item_key_signature: String,
}

impl CreateVaultRequest {
    /// Build the full creation request for a new vault.
    ///
    /// Generates a fresh key hierarchy, seals the content, and encodes
    /// every artifact. Fails before any network call when an encoded field
    /// comes out implausibly short.
    pub fn build(address_key: &AddressKey, vault: &VaultContent) -> Result<Self> {
        let chain = VaultKeyChain::generate(address_key)?;
        let content_bytes = vault.encode_to_bytes();
        let sealed = chain.seal_content(address_key, &content_bytes)?;

        let request = Self {
            address_id: address_key.address_id.clone(),
            content: BASE64.encode(&sealed.encrypted_content),
            content_format_version: CONTENT_FORMAT_VERSION,
            content_encrypted_address_signature: BASE64
                .encode(&sealed.encrypted_address_signature),
            content_encrypted_vault_signature: BASE64.encode(&sealed.encrypted_vault_signature),
            vault_key: chain.vault_key.armored().to_string(),
            vault_key_passphrase: BASE64.encode(&chain.vault_key_passphrase_packets.data_packet),
            vault_key_signature: BASE64.encode(chain.vault_key_signature.as_bytes()),
            key_packet: BASE64.encode(&chain.vault_key_passphrase_packets.key_packet),
            key_packet_signature: BASE64.encode(sealed.key_packet_signature.as_bytes()),
            signing_key: chain.signing_key.armored().to_string(),
            signing_key_passphrase: BASE64
                .encode(&chain.signing_key_passphrase_packets.data_packet),
            signing_key_passphrase_key_packet: BASE64
                .encode(&chain.signing_key_passphrase_packets.key_packet),
            acceptance_signature: BASE64.encode(chain.acceptance_signature.as_bytes()),
            item_key: chain.item_key.armored().to_string(),
            item_key_passphrase: BASE64.encode(&chain.item_key_passphrase_packets.data_packet),
            item_key_passphrase_key_packet: BASE64
                .encode(&chain.item_key_passphrase_packets.key_packet),
            item_key_signature: BASE64.encode(chain.item_key_signature.as_bytes()),
        };
        request.validate()?;
        Ok(request)
    }

    fn validate(&self) -> Result<()> {
        let checks = [
            ("Content", &self.content),
            (
                "ContentEncryptedAddressSignature",
                &self.content_encrypted_address_signature,
            ),
            (
                "ContentEncryptedVaultSignature",
                &self.content_encrypted_vault_signature,
            ),
            ("VaultKeyPassphrase", &self.vault_key_passphrase),
            ("VaultKeySignature", &self.vault_key_signature),
            ("KeyPacket", &self.key_packet),
            ("KeyPacketSignature", &self.key_packet_signature),
            ("SigningKeyPassphrase", &self.signing_key_passphrase),
            (
                "SigningKeyPassphraseKeyPacket",
                &self.signing_key_passphrase_key_packet,
            ),
            ("AcceptanceSignature", &self.acceptance_signature),
            ("ItemKeyPassphrase", &self.item_key_passphrase),
            (
                "ItemKeyPassphraseKeyPacket",
                &self.item_key_passphrase_key_packet,
            ),
            ("ItemKeySignature", &self.item_key_signature),
        ];
        for (name, value) in checks {
            if value.len() < MIN_ENCODED_LEN {
                return Err(Error::Encoding(format!(
                    "{name} is {} chars, below the {MIN_ENCODED_LEN} char floor",
                    value.len()
                )));
            }
        }
        Ok(())
    }
}

/// Vault update request body
#[derive(Debug, Clone, Serialize)]
pub struct UpdateVaultRequest {
    /// Re-encrypted vault content, base64
    #[serde(rename = "Content")]
    pub content: String,
    /// Content payload format version
    #[serde(rename = "ContentFormatVersion")]
    pub content_format_version: u32,
    /// Rotation of the share key the content was encrypted under
    #[serde(rename = "KeyRotation")]
    pub key_rotation: u32,
}

impl UpdateVaultRequest {
    /// Re-encrypt vault content with the share's existing key.
    ///
    /// No new key material is generated; the content is sealed with
    /// authenticated encryption scoped to vault content.
    pub fn build(vault: &VaultContent, share_key: &ShareKeyMaterial) -> Result<Self> {
        let ciphertext = aead::encrypt(
            &share_key.key,
            &vault.encode_to_bytes(),
            aead::VAULT_CONTENT_AAD,
        )?;
        Self::from_encrypted_content(ciphertext, share_key.key_rotation)
    }

    /// Assemble from an already-encrypted content blob, enforcing the
    /// ciphertext sanity floor. An undersized blob is a corruption signal.
    pub fn from_encrypted_content(ciphertext: Vec<u8>, key_rotation: u32) -> Result<Self> {
        if key_rotation == 0 {
            return Err(Error::Encoding(
                "Key rotation must be positive".to_string(),
            ));
        }
        if ciphertext.len() < aead::MIN_CIPHERTEXT_LEN {
            return Err(Error::Encryption(format!(
                "Vault content ciphertext is {} bytes, below the {} byte floor",
                ciphertext.len(),
                aead::MIN_CIPHERTEXT_LEN
            )));
        }
        Ok(Self {
            content: BASE64.encode(&ciphertext),
            content_format_version: CONTENT_FORMAT_VERSION,
            key_rotation,
        })
    }
}

/// Item creation request body
#[derive(Debug, Clone, Serialize)]
pub struct CreateItemRequest {
    /// Encrypted item content, base64
    #[serde(rename = "Content")]
    pub content: String,
    /// Content payload format version
    #[serde(rename = "ContentFormatVersion")]
    pub content_format_version: u32,
    /// Rotation of the share key the content was encrypted under
    #[serde(rename = "KeyRotation")]
    pub key_rotation: u32,
}

impl CreateItemRequest {
    /// Encrypt item content with the share's key
    pub fn build(content_bytes: &[u8], share_key: &ShareKeyMaterial) -> Result<Self> {
        if share_key.key_rotation == 0 {
            return Err(Error::Encoding(
                "Key rotation must be positive".to_string(),
            ));
        }
        let ciphertext = aead::encrypt(&share_key.key, content_bytes, aead::ITEM_CONTENT_AAD)?;
        Ok(Self {
            content: BASE64.encode(&ciphertext),
            content_format_version: CONTENT_FORMAT_VERSION,
            key_rotation: share_key.key_rotation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::aead;
    use zeroize::Zeroizing;

    fn share_key(rotation: u32) -> ShareKeyMaterial {
        ShareKeyMaterial {
            key_rotation: rotation,
            key: Zeroizing::new(*aead::generate_key()),
        }
    }

    #[test]
    fn test_create_vault_request_wire_field_names() {
        let address_key = AddressKey::generate("address-1").unwrap();
        let vault = VaultContent::new("Personal", "");
        let request = CreateVaultRequest::build(&address_key, &vault).unwrap();

        let value = serde_json::to_value(&request).unwrap();
        for field in [
            "AddressID",
            "Content",
            "ContentFormatVersion",
            "ContentEncryptedAddressSignature",
            "ContentEncryptedVaultSignature",
            "VaultKey",
            "VaultKeyPassphrase",
            "VaultKeySignature",
            "KeyPacket",
            "KeyPacketSignature",
            "SigningKey",
            "SigningKeyPassphrase",
            "SigningKeyPassphraseKeyPacket",
            "AcceptanceSignature",
            "ItemKey",
            "ItemKeyPassphrase",
            "ItemKeyPassphraseKeyPacket",
            "ItemKeySignature",
        ] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(value["ContentFormatVersion"], 1);
        assert!(request.content.len() >= 28);
    }

    #[test]
    fn test_update_vault_request_round_numbers() {
        let vault = VaultContent::new("Work", "Team vault");
        let key = share_key(2);
        let request = UpdateVaultRequest::build(&vault, &key).unwrap();
        assert_eq!(request.key_rotation, 2);
        assert_eq!(request.content_format_version, 1);
        assert!(BASE64.decode(&request.content).unwrap().len() >= aead::MIN_CIPHERTEXT_LEN);
    }

    #[test]
    fn test_update_vault_request_rejects_undersized_ciphertext() {
        // A degenerate encryption result below the floor must fail loudly.
        let result = UpdateVaultRequest::from_encrypted_content(vec![0u8; 10], 1);
        assert!(matches!(result, Err(Error::Encryption(_))));
    }

    #[test]
    fn test_update_vault_request_rejects_zero_rotation() {
        let vault = VaultContent::new("Work", "");
        let key = share_key(0);
        assert!(matches!(
            UpdateVaultRequest::build(&vault, &key),
            Err(Error::Encoding(_))
        ));
    }

    #[test]
    fn test_update_content_decrypts_with_share_key() {
        let vault = VaultContent::new("Personal", "Everyday logins");
        let key = share_key(1);
        let request = UpdateVaultRequest::build(&vault, &key).unwrap();

        let ciphertext = BASE64.decode(&request.content).unwrap();
        let plaintext = aead::decrypt(&key.key, &ciphertext, aead::VAULT_CONTENT_AAD).unwrap();
        assert_eq!(VaultContent::decode_from_bytes(&plaintext).unwrap(), vault);
    }

    #[test]
    fn test_create_item_request() {
        let key = share_key(4);
        let request = CreateItemRequest::build(b"item payload", &key).unwrap();
        assert_eq!(request.key_rotation, 4);

        let ciphertext = BASE64.decode(&request.content).unwrap();
        let plaintext = aead::decrypt(&key.key, &ciphertext, aead::ITEM_CONTENT_AAD).unwrap();
        assert_eq!(plaintext, b"item payload");
    }
}
