//! Wire shapes for the share and vault endpoint family

use crate::{Error, Result};
use serde::Deserialize;
use strongbox_core::{ItemData, Share, ShareKey, ShareRole, ShareTargetType};

/// Lightweight share stub from the list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ShareStubDto {
    /// Share identifier
    #[serde(rename = "ShareID")]
    pub share_id: String,
}

/// Full share payload from the detail endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ShareDto {
    /// Share identifier
    #[serde(rename = "ShareID")]
    pub share_id: String,
    /// Address participating in the share
    #[serde(rename = "AddressID")]
    pub address_id: String,
    /// 1 = vault, 2 = item
    #[serde(rename = "TargetType")]
    pub target_type: u32,
    /// Vault or item identifier
    #[serde(rename = "TargetID")]
    pub target_id: String,
    /// 1 = admin, 2 = write, 3 = read
    #[serde(rename = "ShareRoleID")]
    pub share_role_id: u32,
    /// Encrypted vault content, base64
    #[serde(rename = "Content")]
    pub content: Option<String>,
    /// Rotation the content was encrypted under
    #[serde(rename = "ContentKeyRotation")]
    pub content_key_rotation: Option<u32>,
    /// Content format version
    #[serde(rename = "ContentFormatVersion")]
    pub content_format_version: Option<u32>,
    /// Member count
    #[serde(rename = "MemberCount")]
    pub member_count: u32,
    /// Creation time, epoch seconds
    #[serde(rename = "CreateTime")]
    pub create_time: i64,
    /// Expiry, epoch seconds
    #[serde(rename = "ExpireTime")]
    pub expire_time: Option<i64>,
}

impl TryFrom<ShareDto> for Share {
    type Error = Error;

    fn try_from(dto: ShareDto) -> Result<Self> {
        let target_type = match dto.target_type {
            1 => ShareTargetType::Vault,
            2 => ShareTargetType::Item,
            other => {
                return Err(Error::UnexpectedResponse(format!(
                    "Unknown share target type: {other}"
                )))
            }
        };
        let role = match dto.share_role_id {
            1 => ShareRole::Admin,
            2 => ShareRole::Write,
            3 => ShareRole::Read,
            other => {
                return Err(Error::UnexpectedResponse(format!(
                    "Unknown share role: {other}"
                )))
            }
        };
        Ok(Share {
            share_id: dto.share_id,
            address_id: dto.address_id,
            target_type,
            target_id: dto.target_id,
            role,
            content: dto.content,
            content_key_rotation: dto.content_key_rotation,
            content_format_version: dto.content_format_version,
            member_count: dto.member_count,
            create_time: dto.create_time,
            expire_time: dto.expire_time,
        })
    }
}

/// One share key entry
#[derive(Debug, Clone, Deserialize)]
pub struct ShareKeyDto {
    /// Rotation this key belongs to
    #[serde(rename = "KeyRotation")]
    pub key_rotation: u32,
    /// Encrypted key material, base64
    #[serde(rename = "Key")]
    pub key: String,
    /// Address key the material is encrypted to
    #[serde(rename = "UserKeyID")]
    pub user_key_id: String,
    /// Creation time, epoch seconds
    #[serde(rename = "CreateTime")]
    pub create_time: i64,
}

impl From<ShareKeyDto> for ShareKey {
    fn from(dto: ShareKeyDto) -> Self {
        Self {
            key_rotation: dto.key_rotation,
            key: dto.key,
            user_key_id: dto.user_key_id,
            create_time: dto.create_time,
        }
    }
}

/// Item revision payload
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDto {
    /// Item identifier
    #[serde(rename = "ItemID")]
    pub item_id: String,
    /// Revision counter
    #[serde(rename = "Revision")]
    pub revision: u32,
    /// Encrypted content, base64
    #[serde(rename = "Content")]
    pub content: String,
    /// Content format version
    #[serde(rename = "ContentFormatVersion")]
    pub content_format_version: u32,
    /// Rotation the content was encrypted under
    #[serde(rename = "KeyRotation")]
    pub key_rotation: u32,
    /// Item state
    #[serde(rename = "State")]
    pub state: u32,
    /// Creation time, epoch seconds
    #[serde(rename = "CreateTime")]
    pub create_time: i64,
    /// Modification time, epoch seconds
    #[serde(rename = "ModifyTime")]
    pub modify_time: i64,
}

impl From<ItemDto> for ItemData {
    fn from(dto: ItemDto) -> Self {
        Self {
            item_id: dto.item_id,
            revision: dto.revision,
            content: dto.content,
            content_format_version: dto.content_format_version,
            key_rotation: dto.key_rotation,
            state: dto.state,
            create_time: dto.create_time,
            modify_time: dto.modify_time,
        }
    }
}

/// Response of the share list endpoint
#[derive(Debug, Deserialize)]
pub struct GetSharesResponse {
    /// Share stubs
    #[serde(rename = "Shares")]
    pub shares: Vec<ShareStubDto>,
}

/// Response of the share detail endpoint
#[derive(Debug, Deserialize)]
pub struct GetShareResponse {
    /// The share
    #[serde(rename = "Share")]
    pub share: ShareDto,
}

/// Response of the share key endpoint
#[derive(Debug, Deserialize)]
pub struct GetShareKeysResponse {
    /// Paginated key material
    #[serde(rename = "ShareKeys")]
    pub share_keys: ShareKeysDto,
}

/// Paginated key material
#[derive(Debug, Deserialize)]
pub struct ShareKeysDto {
    /// Keys on this page
    #[serde(rename = "Keys")]
    pub keys: Vec<ShareKeyDto>,
    /// Total number of keys across all pages
    #[serde(rename = "Total")]
    pub total: u64,
}

/// Response of vault create/update endpoints
#[derive(Debug, Deserialize)]
pub struct VaultShareResponse {
    /// The created or updated share
    #[serde(rename = "Share")]
    pub share: ShareDto,
}

/// Response of the item creation endpoint
#[derive(Debug, Deserialize)]
pub struct CreateItemResponse {
    /// The created item revision
    #[serde(rename = "Item")]
    pub item: ItemDto,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_share_dto_decodes_and_converts() {
        let value = json!({
            "ShareID": "share-1",
            "AddressID": "address-1",
            "TargetType": 1,
            "TargetID": "vault-1",
            "ShareRoleID": 1,
            "Content": "Y29udGVudA==",
            "ContentKeyRotation": 2,
            "ContentFormatVersion": 1,
            "MemberCount": 3,
            "CreateTime": 1700000000,
            "ExpireTime": null
        });
        let dto: ShareDto = serde_json::from_value(value).unwrap();
        let share = Share::try_from(dto).unwrap();
        assert_eq!(share.share_id, "share-1");
        assert_eq!(share.target_type, ShareTargetType::Vault);
        assert_eq!(share.role, ShareRole::Admin);
        assert_eq!(share.content_key_rotation, Some(2));
    }

    #[test]
    fn test_unknown_target_type_rejected() {
        let value = json!({
            "ShareID": "share-1",
            "AddressID": "address-1",
            "TargetType": 9,
            "TargetID": "vault-1",
            "ShareRoleID": 1,
            "Content": null,
            "ContentKeyRotation": null,
            "ContentFormatVersion": null,
            "MemberCount": 1,
            "CreateTime": 1700000000,
            "ExpireTime": null
        });
        let dto: ShareDto = serde_json::from_value(value).unwrap();
        assert!(matches!(
            Share::try_from(dto),
            Err(Error::UnexpectedResponse(_))
        ));
    }
}
