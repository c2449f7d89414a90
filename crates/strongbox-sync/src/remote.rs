//! Remote datasource
//!
//! Thin, typed layer over the transport. Errors propagate unchanged; the
//! retry policy belongs to the transport.

use crate::endpoints::{
    CreateItemResponse, GetShareKeysResponse, GetShareResponse, GetSharesResponse,
    VaultShareResponse,
};
use crate::transport::{ApiRequest, ApiTransport};
use crate::{Error, Result};
use std::sync::Arc;
use strongbox_core::{
    CreateItemRequest, CreateVaultRequest, ItemData, Share, ShareKey, UpdateVaultRequest,
};
use tokio::task::JoinSet;
use tracing::{debug, trace};

/// Authenticated remote source of truth for shares, keys, and items
pub struct RemoteDatasource {
    transport: Arc<dyn ApiTransport>,
}

impl RemoteDatasource {
    /// Create the datasource over a transport
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    /// Fetch all shares: list the stubs, then fan out one concurrent
    /// detail fetch per stub.
    ///
    /// All detail fetches must succeed; a single failure fails the whole
    /// call so callers never observe partial share state.
    pub async fn get_shares(&self) -> Result<Vec<Share>> {
        let value = self.transport.execute(ApiRequest::get("pass/v1/share")).await?;
        let response: GetSharesResponse = serde_json::from_value(value)?;
        trace!("Fetched {} share stubs", response.shares.len());

        let mut tasks = JoinSet::new();
        for stub in response.shares {
            let transport = Arc::clone(&self.transport);
            tasks.spawn(async move {
                let value = transport
                    .execute(ApiRequest::get(format!("pass/v1/share/{}", stub.share_id)))
                    .await?;
                let response: GetShareResponse = serde_json::from_value(value)?;
                Share::try_from(response.share)
            });
        }

        let mut shares = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let share = joined.map_err(|e| Error::Join(e.to_string()))??;
            shares.push(share);
        }
        debug!("Fetched {} shares from remote", shares.len());
        Ok(shares)
    }

    /// Fetch one page of key material for a share
    pub async fn get_share_keys(
        &self,
        share_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ShareKey>> {
        let value = self
            .transport
            .execute(ApiRequest::get(format!(
                "pass/v1/share/{share_id}/key?Page={page}&PageSize={page_size}"
            )))
            .await?;
        let response: GetShareKeysResponse = serde_json::from_value(value)?;
        trace!(
            "Fetched {} of {} keys for share {}",
            response.share_keys.keys.len(),
            response.share_keys.total,
            share_id
        );
        Ok(response.share_keys.keys.into_iter().map(Into::into).collect())
    }

    /// Create a vault from a fully assembled creation request
    pub async fn create_vault(&self, request: &CreateVaultRequest) -> Result<Share> {
        let value = self
            .transport
            .execute(ApiRequest::post(
                "pass/v1/vault",
                serde_json::to_value(request)?,
            ))
            .await?;
        let response: VaultShareResponse = serde_json::from_value(value)?;
        Share::try_from(response.share)
    }

    /// Update a vault's content in place
    pub async fn update_vault(
        &self,
        share_id: &str,
        request: &UpdateVaultRequest,
    ) -> Result<Share> {
        let value = self
            .transport
            .execute(ApiRequest::put(
                format!("pass/v1/vault/{share_id}"),
                serde_json::to_value(request)?,
            ))
            .await?;
        let response: VaultShareResponse = serde_json::from_value(value)?;
        Share::try_from(response.share)
    }

    /// Delete a vault and every share granting access to it
    pub async fn delete_vault(&self, share_id: &str) -> Result<()> {
        self.transport
            .execute(ApiRequest::delete(format!("pass/v1/vault/{share_id}")))
            .await?;
        debug!("Deleted vault share {}", share_id);
        Ok(())
    }

    /// Create an item inside a share
    pub async fn create_item(
        &self,
        share_id: &str,
        request: &CreateItemRequest,
    ) -> Result<ItemData> {
        let value = self
            .transport
            .execute(ApiRequest::post(
                format!("pass/v1/share/{share_id}/item"),
                serde_json::to_value(request)?,
            ))
            .await?;
        let response: CreateItemResponse = serde_json::from_value(value)?;
        Ok(response.item.into())
    }
}
