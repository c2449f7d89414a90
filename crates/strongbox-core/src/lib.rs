//! Strongbox vault engine core
//!
//! This crate implements the cryptographic heart of the vault engine:
//! the locked keypair model, hybrid encryption with key/data packet
//! splitting, the vault key hierarchy, and the encrypted request codecs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod crypto;
pub mod error;
pub mod models;
pub mod vault;

pub use error::{Error, Result};
pub use models::{
    AddressKey, AutoFillCredential, ItemContent, ItemContentData, ItemData, Share, ShareIdentifiable,
    ShareKey, ShareKeyMaterial, ShareRole, ShareTargetType, VaultScoped,
};
pub use vault::content::{VaultContent, CONTENT_FORMAT_VERSION};
pub use vault::keychain::VaultKeyChain;
pub use vault::requests::{CreateItemRequest, CreateVaultRequest, UpdateVaultRequest};
