//! Credential rank updater
//!
//! The only writer of the OS-visible credential suggestion rows. After an
//! item is autofilled or edited, its stored URLs are matched against the
//! service identifiers of the request; every matched URL gets one ranking
//! row. Unparsable URLs and identifiers are dropped without error; a
//! login item that matches nothing simply produces no rows.

use chrono::{DateTime, Utc};
use http::Uri;
use strongbox_core::{AutoFillCredential, ItemContent, ItemContentData};
use strongbox_storage_sqlite::LocalCredentialDatasource;
use tracing::{debug, trace};

use crate::matcher::match_urls;
use crate::service_identifier::ServiceIdentifier;
use crate::{Error, Result};

/// Persists ranking hints for the OS credential picker
pub struct UpdateCredentialRank {
    store: LocalCredentialDatasource,
}

impl UpdateCredentialRank {
    /// Create the updater over the credential store
    pub fn new(store: LocalCredentialDatasource) -> Self {
        Self { store }
    }

    /// Rank a login item against the request's service identifiers.
    ///
    /// Returns the number of rows written. Fails with
    /// [`Error::NotLoginItem`] when the item is not a login.
    pub fn execute(
        &self,
        item: &ItemContent,
        service_identifiers: &[ServiceIdentifier],
        last_use_time: DateTime<Utc>,
    ) -> Result<usize> {
        let (username, urls) = item.login().ok_or(Error::NotLoginItem)?;

        let service_urls: Vec<Uri> = service_identifiers
            .iter()
            .filter_map(ServiceIdentifier::to_service_url)
            .collect();

        let mut credentials = Vec::new();
        for raw_url in urls {
            let Ok(item_url) = raw_url.parse::<Uri>() else {
                trace!("Dropping unparsable item URL");
                continue;
            };
            let matched = service_urls
                .iter()
                .any(|service_url| match_urls(&item_url, service_url).is_matched());
            if matched {
                credentials.push(AutoFillCredential {
                    share_id: item.share_id.clone(),
                    item_id: item.item_id.clone(),
                    username: username.to_string(),
                    url: raw_url.clone(),
                    last_use_time: last_use_time.timestamp(),
                });
            }
        }

        self.store.insert_credentials(&credentials)?;
        debug!(
            "Ranked item {} with {} matched URLs",
            item.item_id,
            credentials.len()
        );
        Ok(credentials.len())
    }

    /// Rebuild the whole suggestion table from all login items: remove
    /// every row, then insert one row per stored URL.
    pub fn populate(&self, items: &[ItemContent], now: DateTime<Utc>) -> Result<usize> {
        self.store.remove_all()?;

        let mut credentials = Vec::new();
        for item in items {
            if let ItemContentData::Login { username, urls, .. } = &item.data {
                for url in urls {
                    credentials.push(AutoFillCredential {
                        share_id: item.share_id.clone(),
                        item_id: item.item_id.clone(),
                        username: username.clone(),
                        url: url.clone(),
                        last_use_time: now.timestamp(),
                    });
                }
            }
        }
        self.store.insert_credentials(&credentials)?;
        debug!("Populated {} credential rows", credentials.len());
        Ok(credentials.len())
    }

    /// Swap a login item's rows after an edit: the old URLs are removed
    /// before the new ones are inserted.
    pub fn replace(
        &self,
        old_item: &ItemContent,
        new_item: &ItemContent,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let (old_username, old_urls) = old_item.login().ok_or(Error::NotLoginItem)?;
        let (new_username, new_urls) = new_item.login().ok_or(Error::NotLoginItem)?;

        let old_rows: Vec<AutoFillCredential> = old_urls
            .iter()
            .map(|url| AutoFillCredential {
                share_id: old_item.share_id.clone(),
                item_id: old_item.item_id.clone(),
                username: old_username.to_string(),
                url: url.clone(),
                last_use_time: now.timestamp(),
            })
            .collect();
        self.store.remove_credentials(&old_rows)?;

        let new_rows: Vec<AutoFillCredential> = new_urls
            .iter()
            .map(|url| AutoFillCredential {
                share_id: new_item.share_id.clone(),
                item_id: new_item.item_id.clone(),
                username: new_username.to_string(),
                url: url.clone(),
                last_use_time: now.timestamp(),
            })
            .collect();
        self.store.insert_credentials(&new_rows)?;
        Ok(())
    }
}
