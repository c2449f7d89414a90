//! Vault content payload
//!
//! Wire format version 1: a protobuf message carrying the vault's
//! user-visible metadata. The message type is written by hand; no proto
//! codegen step is involved.

use crate::Result;
use prost::Message;

/// Version of the vault content wire format
pub const CONTENT_FORMAT_VERSION: u32 = 1;

/// Plaintext vault metadata, encrypted before leaving the device
#[derive(Clone, PartialEq, Message)]
pub struct VaultContent {
    /// Vault display name
    #[prost(string, tag = "1")]
    pub name: String,
    /// Vault description
    #[prost(string, tag = "2")]
    pub description: String,
}

impl VaultContent {
    /// Build from name and description
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Encode to the wire bytes that get encrypted
    pub fn encode_to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Decode from decrypted wire bytes
    pub fn decode_from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::decode(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip() {
        let content = VaultContent::new("Personal", "Everyday logins");
        let decoded = VaultContent::decode_from_bytes(&content.encode_to_bytes()).unwrap();
        assert_eq!(decoded, content);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(VaultContent::decode_from_bytes(&[0xff, 0xff, 0xff]).is_err());
    }
}
