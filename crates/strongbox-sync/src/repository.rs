//! Share repository
//!
//! Cache-aside sync coordinator. Reads prefer the local cache and fall
//! back to remote when the cache is empty; a forced update always goes
//! remote. Every remote fetch is persisted to the cache before the call
//! returns, so the next non-forced read observes it. An empty local result
//! is the only cache-miss signal; there is deliberately no staleness
//! tracking, so an account with zero shares re-fetches on every read.

use crate::config::EnvironmentConfig;
use crate::remote::RemoteDatasource;
use crate::transport::ApiTransport;
use crate::{Error, Result};
use std::sync::Arc;
use strongbox_core::{
    AddressKey, CreateItemRequest, CreateVaultRequest, ItemData, Share, ShareKey,
    UpdateVaultRequest, VaultContent,
};
use strongbox_storage_sqlite::{
    Database, LocalCredentialDatasource, LocalShareDatasource, LocalShareKeyDatasource,
};
use tracing::{debug, info, trace};

/// Page size used when resolving the latest share key
const DEFAULT_KEY_PAGE_SIZE: u32 = 100;

/// Coordinates the local cache with the remote source of truth
pub struct ShareRepository {
    config: EnvironmentConfig,
    remote: RemoteDatasource,
    local_shares: LocalShareDatasource,
    local_share_keys: LocalShareKeyDatasource,
    local_credentials: LocalCredentialDatasource,
}

impl ShareRepository {
    /// Build a repository over a transport and an opened database
    pub fn new(
        config: EnvironmentConfig,
        transport: Arc<dyn ApiTransport>,
        db: Arc<Database>,
    ) -> Self {
        Self {
            config,
            remote: RemoteDatasource::new(transport),
            local_shares: LocalShareDatasource::new(Arc::clone(&db)),
            local_share_keys: LocalShareKeyDatasource::new(Arc::clone(&db)),
            local_credentials: LocalCredentialDatasource::new(db),
        }
    }

    /// All shares for the current user.
    ///
    /// `force_update` bypasses the cache and guarantees a remote round
    /// trip whose result overwrites the cached entries.
    pub async fn get_shares(&self, force_update: bool) -> Result<Vec<Share>> {
        if force_update {
            return self.fetch_shares_and_cache().await;
        }

        let local = self.local_shares.fetch_shares(&self.config.user_id)?;
        if local.is_empty() {
            trace!("No local shares for user {}", self.config.user_id);
            return self.fetch_shares_and_cache().await;
        }
        trace!(
            "Serving {} shares for user {} from cache",
            local.len(),
            self.config.user_id
        );
        Ok(local)
    }

    async fn fetch_shares_and_cache(&self) -> Result<Vec<Share>> {
        let shares = self.remote.get_shares().await?;
        self.local_shares
            .insert_shares(&shares, &self.config.user_id)?;
        debug!(
            "Cached {} remote shares for user {}",
            shares.len(),
            self.config.user_id
        );
        Ok(shares)
    }

    /// One page of key material for a share, cache-aside like
    /// [`Self::get_shares`]
    pub async fn get_share_keys(
        &self,
        force_update: bool,
        share_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ShareKey>> {
        if force_update {
            return self.fetch_share_keys_and_cache(share_id, page, page_size).await;
        }

        let local = self
            .local_share_keys
            .fetch_share_keys(share_id, page, page_size)?;
        if local.is_empty() {
            trace!("No local keys for share {}", share_id);
            return self.fetch_share_keys_and_cache(share_id, page, page_size).await;
        }
        Ok(local)
    }

    async fn fetch_share_keys_and_cache(
        &self,
        share_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ShareKey>> {
        let keys = self.remote.get_share_keys(share_id, page, page_size).await?;
        self.local_share_keys.insert_share_keys(share_id, &keys)?;
        debug!("Cached {} remote keys for share {}", keys.len(), share_id);
        Ok(keys)
    }

    /// The share key with the highest rotation.
    ///
    /// Retries once with a forced refresh when the first attempt comes
    /// back empty; failing after that means the share genuinely has no
    /// key material.
    pub async fn get_latest_share_key(&self, share_id: &str) -> Result<ShareKey> {
        let keys = self
            .get_share_keys(false, share_id, 0, DEFAULT_KEY_PAGE_SIZE)
            .await?;
        if let Some(latest) = keys.into_iter().max_by_key(|k| k.key_rotation) {
            return Ok(latest);
        }

        debug!("No keys for share {} on first attempt, forcing refresh", share_id);
        let keys = self
            .get_share_keys(true, share_id, 0, DEFAULT_KEY_PAGE_SIZE)
            .await?;
        keys.into_iter()
            .max_by_key(|k| k.key_rotation)
            .ok_or_else(|| Error::NoShareKeys(share_id.to_string()))
    }

    /// Create a vault and cache the resulting share
    pub async fn create_vault(
        &self,
        address_key: &AddressKey,
        vault: &VaultContent,
    ) -> Result<Share> {
        trace!("Creating vault for user {}", self.config.user_id);
        let request = CreateVaultRequest::build(address_key, vault)?;
        let share = self.remote.create_vault(&request).await?;
        self.local_shares
            .insert_shares(&[share.clone()], &self.config.user_id)?;
        info!("Created vault share {} for user {}", share.share_id, self.config.user_id);
        Ok(share)
    }

    /// Re-encrypt a vault's content under its latest share key and push
    /// the update, caching the returned share
    pub async fn edit_vault(
        &self,
        address_key: &AddressKey,
        share_id: &str,
        vault: &VaultContent,
    ) -> Result<Share> {
        trace!("Editing vault {} for user {}", share_id, self.config.user_id);
        let share_key = self.get_latest_share_key(share_id).await?;
        let material = share_key.open(address_key)?;
        let request = UpdateVaultRequest::build(vault, &material)?;
        let updated = self.remote.update_vault(share_id, &request).await?;
        self.local_shares
            .insert_shares(&[updated.clone()], &self.config.user_id)?;
        info!("Updated vault share {} for user {}", share_id, self.config.user_id);
        Ok(updated)
    }

    /// Delete a vault remotely and drop it from the local cache along
    /// with its key material
    pub async fn delete_vault(&self, share_id: &str) -> Result<()> {
        self.remote.delete_vault(share_id).await?;
        self.local_shares
            .remove_share(&self.config.user_id, share_id)?;
        self.local_share_keys.remove_share_keys(share_id)?;
        info!("Deleted vault share {} for user {}", share_id, self.config.user_id);
        Ok(())
    }

    /// Encrypt and create an item inside a share
    pub async fn create_item(
        &self,
        address_key: &AddressKey,
        share_id: &str,
        content_bytes: &[u8],
    ) -> Result<ItemData> {
        let share_key = self.get_latest_share_key(share_id).await?;
        let material = share_key.open(address_key)?;
        let request = CreateItemRequest::build(content_bytes, &material)?;
        let item = self.remote.create_item(share_id, &request).await?;
        debug!("Created item {} in share {}", item.item_id, share_id);
        Ok(item)
    }

    /// Tear down all cached state for this environment's user
    pub fn logout(&self) -> Result<()> {
        self.local_shares.remove_all_shares(&self.config.user_id)?;
        self.local_share_keys.remove_all()?;
        self.local_credentials.remove_all()?;
        info!("Cleared local cache for user {}", self.config.user_id);
        Ok(())
    }
}
