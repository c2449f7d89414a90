//! Domain models

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::hybrid::{self, EncryptedMessage};
use crate::crypto::keypair::{LockedKeyPair, Passphrase, UnlockedKeyPair};
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// What a share grants access to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareTargetType {
    /// Whole-vault share
    Vault,
    /// Single-item share
    Item,
}

/// Role of the user within a share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareRole {
    /// Full management rights
    Admin,
    /// Read and write items
    Write,
    /// Read only
    Read,
}

/// A vault or item sharing grant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Share {
    /// Stable share identifier
    pub share_id: String,
    /// Address through which the user participates in the share
    pub address_id: String,
    /// Vault or item share
    pub target_type: ShareTargetType,
    /// Identifier of the vault or item being shared
    pub target_id: String,
    /// Role granted to the user
    pub role: ShareRole,
    /// Encrypted vault content, base64 (vault shares only)
    pub content: Option<String>,
    /// Key rotation the content was encrypted under
    pub content_key_rotation: Option<u32>,
    /// Content payload format version
    pub content_format_version: Option<u32>,
    /// Number of members with access
    pub member_count: u32,
    /// Creation timestamp, epoch seconds
    pub create_time: i64,
    /// Optional expiry, epoch seconds
    pub expire_time: Option<i64>,
}

/// Versioned decryption key for a share's contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareKey {
    /// Key rotation this key belongs to; higher is newer
    pub key_rotation: u32,
    /// Encrypted key material, base64 of a combined hybrid message
    /// addressed to the user's address key
    pub key: String,
    /// Address key the material is encrypted to
    pub user_key_id: String,
    /// Creation timestamp, epoch seconds
    pub create_time: i64,
}

impl ShareKey {
    /// Decrypt the key material with the owning address key
    pub fn open(&self, address_key: &AddressKey) -> Result<ShareKeyMaterial> {
        let combined = BASE64
            .decode(&self.key)
            .map_err(|e| Error::Encoding(format!("Invalid share key encoding: {e}")))?;
        let message = EncryptedMessage::from_combined(&combined)?;
        let unlocked = address_key.unlock()?;
        let raw = Zeroizing::new(hybrid::decrypt(&unlocked, &message)?);
        let key: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidKey("Share key is not 32 bytes".to_string()))?;
        Ok(ShareKeyMaterial {
            key_rotation: self.key_rotation,
            key: Zeroizing::new(key),
        })
    }
}

/// Decrypted share key material, zeroized on drop
pub struct ShareKeyMaterial {
    /// Rotation the material belongs to
    pub key_rotation: u32,
    /// Raw symmetric key
    pub key: Zeroizing<[u8; 32]>,
}

/// The user's identity key for one email address
pub struct AddressKey {
    /// Stable address identifier
    pub address_id: String,
    /// The locked keypair
    pub key: LockedKeyPair,
    /// Passphrase unlocking the private half
    pub passphrase: Passphrase,
}

impl AddressKey {
    /// Generate a fresh address key (account bootstrap and tests)
    pub fn generate(address_id: impl Into<String>) -> Result<Self> {
        let (key, passphrase) = LockedKeyPair::generate()?;
        Ok(Self {
            address_id: address_id.into(),
            key,
            passphrase,
        })
    }

    /// Unlock the private half
    pub fn unlock(&self) -> Result<UnlockedKeyPair> {
        self.key.unlock(&self.passphrase)
    }
}

impl std::fmt::Debug for AddressKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressKey")
            .field("address_id", &self.address_id)
            .finish_non_exhaustive()
    }
}

/// Decrypted content of an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemContent {
    /// Share the item lives in
    pub share_id: String,
    /// Item identifier
    pub item_id: String,
    /// Display name
    pub name: String,
    /// Typed payload
    pub data: ItemContentData,
}

/// Typed item payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemContentData {
    /// Login credential
    Login {
        /// Username or email
        username: String,
        /// Password
        password: String,
        /// Associated website URLs
        urls: Vec<String>,
    },
    /// Free-form secure note
    Note,
    /// Email alias
    Alias,
}

impl ItemContent {
    /// Login payload, if this is a login item
    pub fn login(&self) -> Option<(&str, &[String])> {
        match &self.data {
            ItemContentData::Login { username, urls, .. } => Some((username, urls)),
            _ => None,
        }
    }
}

/// Server-side representation of a created or fetched item revision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemData {
    /// Item identifier
    pub item_id: String,
    /// Monotonic revision counter
    pub revision: u32,
    /// Encrypted content, base64
    pub content: String,
    /// Content payload format version
    pub content_format_version: u32,
    /// Key rotation the content was encrypted under
    pub key_rotation: u32,
    /// Item state (active, trashed)
    pub state: u32,
    /// Creation timestamp, epoch seconds
    pub create_time: i64,
    /// Last modification timestamp, epoch seconds
    pub modify_time: i64,
}

/// Per-URL ranking projection of a login item for the OS credential picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoFillCredential {
    /// Share the login item lives in
    pub share_id: String,
    /// Item identifier
    pub item_id: String,
    /// Username shown in the suggestion
    pub username: String,
    /// Matched URL this row ranks for
    pub url: String,
    /// Last use, epoch seconds
    pub last_use_time: i64,
}

/// Anything that carries a share id
pub trait ShareIdentifiable {
    /// The share this object belongs to
    fn share_id(&self) -> &str;
}

impl ShareIdentifiable for ItemContent {
    fn share_id(&self) -> &str {
        &self.share_id
    }
}

/// An object paired with the vault share it belongs to
#[derive(Debug, Clone)]
pub struct VaultScoped<T> {
    /// The owning vault share
    pub vault: Share,
    /// The scoped object
    pub object: T,
}

impl<T: ShareIdentifiable> VaultScoped<T> {
    /// Pair `object` with the vault owning its share id.
    ///
    /// Fails with [`Error::VaultNotFound`] when no vault share matches.
    pub fn new(vaults: &[Share], object: T) -> Result<Self> {
        let vault = vaults
            .iter()
            .find(|v| v.target_type == ShareTargetType::Vault && v.share_id == object.share_id())
            .cloned()
            .ok_or_else(|| Error::VaultNotFound(object.share_id().to_string()))?;
        Ok(Self { vault, object })
    }
}
