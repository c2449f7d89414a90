//! Local datasources
//!
//! Each datasource owns one table family. Bulk writes run inside a single
//! transaction: either the whole batch lands or none of it does, and the
//! caller sees that as one `BatchInsert` error.

use crate::{Database, Error, Result};
use rusqlite::params;
use std::sync::Arc;
use strongbox_core::{AutoFillCredential, Share, ShareKey, ShareRole, ShareTargetType};

fn target_type_to_int(value: ShareTargetType) -> i64 {
    match value {
        ShareTargetType::Vault => 1,
        ShareTargetType::Item => 2,
    }
}

fn target_type_from_int(value: i64) -> Result<ShareTargetType> {
    match value {
        1 => Ok(ShareTargetType::Vault),
        2 => Ok(ShareTargetType::Item),
        other => Err(Error::Validation(format!("Unknown target type: {other}"))),
    }
}

fn role_to_int(value: ShareRole) -> i64 {
    match value {
        ShareRole::Admin => 1,
        ShareRole::Write => 2,
        ShareRole::Read => 3,
    }
}

fn role_from_int(value: i64) -> Result<ShareRole> {
    match value {
        1 => Ok(ShareRole::Admin),
        2 => Ok(ShareRole::Write),
        3 => Ok(ShareRole::Read),
        other => Err(Error::Validation(format!("Unknown share role: {other}"))),
    }
}

struct ShareRow {
    share_id: String,
    address_id: String,
    target_type: i64,
    target_id: String,
    role: i64,
    content: Option<Vec<u8>>,
    content_key_rotation: Option<u32>,
    content_format_version: Option<u32>,
    member_count: u32,
    create_time: i64,
    expire_time: Option<i64>,
}

/// Cache of shares, scoped per user
pub struct LocalShareDatasource {
    db: Arc<Database>,
}

impl LocalShareDatasource {
    /// Create the datasource
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Idempotent bulk upsert keyed by (user id, share id).
    ///
    /// Empty input is a no-op. Partial failure rolls the whole batch back.
    pub fn insert_shares(&self, shares: &[Share], user_id: &str) -> Result<()> {
        if shares.is_empty() {
            return Ok(());
        }
        tracing::trace!("Upserting {} shares for user {}", shares.len(), user_id);

        let master_key = self.db.master_key().clone();
        let mut conn = self.db.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::BatchInsert(e.to_string()))?;

        let result: Result<()> = (|| {
            for share in shares {
                let content = match &share.content {
                    Some(content) => Some(master_key.encrypt_string(content)?),
                    None => None,
                };
                tx.execute(
                    "INSERT INTO shares (user_id, share_id, address_id, target_type, target_id,
                                         role, content, content_key_rotation,
                                         content_format_version, member_count, create_time,
                                         expire_time)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                     ON CONFLICT(user_id, share_id) DO UPDATE SET
                       address_id=excluded.address_id,
                       target_type=excluded.target_type,
                       target_id=excluded.target_id,
                       role=excluded.role,
                       content=excluded.content,
                       content_key_rotation=excluded.content_key_rotation,
                       content_format_version=excluded.content_format_version,
                       member_count=excluded.member_count,
                       create_time=excluded.create_time,
                       expire_time=excluded.expire_time",
                    params![
                        user_id,
                        share.share_id,
                        share.address_id,
                        target_type_to_int(share.target_type),
                        share.target_id,
                        role_to_int(share.role),
                        content,
                        share.content_key_rotation,
                        share.content_format_version,
                        share.member_count,
                        share.create_time,
                        share.expire_time,
                    ],
                )?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => tx.commit().map_err(|e| Error::BatchInsert(e.to_string())),
            Err(e) => Err(Error::BatchInsert(e.to_string())),
        }
    }

    /// All shares cached for `user_id`, order unspecified.
    ///
    /// An empty user id short-circuits to an empty list without touching
    /// the store.
    pub fn fetch_shares(&self, user_id: &str) -> Result<Vec<Share>> {
        if user_id.is_empty() {
            return Ok(Vec::new());
        }

        let rows = {
            let conn = self.db.lock();
            let mut stmt = conn.prepare(
                "SELECT share_id, address_id, target_type, target_id, role, content,
                        content_key_rotation, content_format_version, member_count,
                        create_time, expire_time
                 FROM shares WHERE user_id = ?1",
            )?;
            let mapped = stmt.query_map([user_id], |row| {
                Ok(ShareRow {
                    share_id: row.get(0)?,
                    address_id: row.get(1)?,
                    target_type: row.get(2)?,
                    target_id: row.get(3)?,
                    role: row.get(4)?,
                    content: row.get(5)?,
                    content_key_rotation: row.get(6)?,
                    content_format_version: row.get(7)?,
                    member_count: row.get(8)?,
                    create_time: row.get(9)?,
                    expire_time: row.get(10)?,
                })
            })?;
            mapped.collect::<std::result::Result<Vec<_>, _>>()?
        };

        let master_key = self.db.master_key();
        let mut shares = Vec::with_capacity(rows.len());
        for row in rows {
            let content = match row.content {
                Some(encrypted) => Some(master_key.decrypt_string(&encrypted)?),
                None => None,
            };
            shares.push(Share {
                share_id: row.share_id,
                address_id: row.address_id,
                target_type: target_type_from_int(row.target_type)?,
                target_id: row.target_id,
                role: role_from_int(row.role)?,
                content,
                content_key_rotation: row.content_key_rotation,
                content_format_version: row.content_format_version,
                member_count: row.member_count,
                create_time: row.create_time,
                expire_time: row.expire_time,
            });
        }
        tracing::trace!("Fetched {} shares for user {}", shares.len(), user_id);
        Ok(shares)
    }

    /// Remove one cached share
    pub fn remove_share(&self, user_id: &str, share_id: &str) -> Result<()> {
        let conn = self.db.lock();
        conn.execute(
            "DELETE FROM shares WHERE user_id = ?1 AND share_id = ?2",
            params![user_id, share_id],
        )?;
        Ok(())
    }

    /// Remove all shares cached for `user_id`
    pub fn remove_all_shares(&self, user_id: &str) -> Result<()> {
        let conn = self.db.lock();
        let removed = conn.execute("DELETE FROM shares WHERE user_id = ?1", [user_id])?;
        tracing::debug!("Removed {} cached shares for user {}", removed, user_id);
        Ok(())
    }
}

/// Cache of share keys, scoped per share
pub struct LocalShareKeyDatasource {
    db: Arc<Database>,
}

impl LocalShareKeyDatasource {
    /// Create the datasource
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Idempotent bulk upsert keyed by (share id, key rotation)
    pub fn insert_share_keys(&self, share_id: &str, keys: &[ShareKey]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        tracing::trace!("Upserting {} keys for share {}", keys.len(), share_id);

        let master_key = self.db.master_key().clone();
        let mut conn = self.db.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::BatchInsert(e.to_string()))?;

        let result: Result<()> = (|| {
            for key in keys {
                let sealed = master_key.encrypt_string(&key.key)?;
                tx.execute(
                    "INSERT INTO share_keys (share_id, key_rotation, key, user_key_id,
                                             create_time)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(share_id, key_rotation) DO UPDATE SET
                       key=excluded.key,
                       user_key_id=excluded.user_key_id,
                       create_time=excluded.create_time",
                    params![
                        share_id,
                        key.key_rotation,
                        sealed,
                        key.user_key_id,
                        key.create_time,
                    ],
                )?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => tx.commit().map_err(|e| Error::BatchInsert(e.to_string())),
            Err(e) => Err(Error::BatchInsert(e.to_string())),
        }
    }

    /// One page of cached keys for a share, ordered by rotation.
    ///
    /// An empty result means no key material at all for that page; the
    /// caller decides whether that is a cache miss.
    pub fn fetch_share_keys(
        &self,
        share_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ShareKey>> {
        let rows = {
            let conn = self.db.lock();
            let mut stmt = conn.prepare(
                "SELECT key_rotation, key, user_key_id, create_time
                 FROM share_keys WHERE share_id = ?1
                 ORDER BY key_rotation
                 LIMIT ?2 OFFSET ?3",
            )?;
            let mapped = stmt.query_map(
                params![share_id, page_size, page as i64 * page_size as i64],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )?;
            mapped.collect::<std::result::Result<Vec<_>, _>>()?
        };

        let master_key = self.db.master_key();
        let mut keys = Vec::with_capacity(rows.len());
        for (key_rotation, sealed, user_key_id, create_time) in rows {
            keys.push(ShareKey {
                key_rotation,
                key: master_key.decrypt_string(&sealed)?,
                user_key_id,
                create_time,
            });
        }
        Ok(keys)
    }

    /// Remove all cached keys for a share
    pub fn remove_share_keys(&self, share_id: &str) -> Result<()> {
        let conn = self.db.lock();
        conn.execute("DELETE FROM share_keys WHERE share_id = ?1", [share_id])?;
        Ok(())
    }

    /// Remove every cached share key
    pub fn remove_all(&self) -> Result<()> {
        let conn = self.db.lock();
        conn.execute("DELETE FROM share_keys", [])?;
        Ok(())
    }
}

/// Store of autofill credential ranking rows
pub struct LocalCredentialDatasource {
    db: Arc<Database>,
}

impl LocalCredentialDatasource {
    /// Create the datasource
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Bulk upsert keyed by (share id, item id, url).
    ///
    /// Empty input is a no-op; partial failure rolls the batch back.
    pub fn insert_credentials(&self, credentials: &[AutoFillCredential]) -> Result<()> {
        if credentials.is_empty() {
            return Ok(());
        }

        let mut conn = self.db.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::BatchInsert(e.to_string()))?;

        let result: Result<()> = (|| {
            for credential in credentials {
                tx.execute(
                    "INSERT INTO autofill_credentials (share_id, item_id, username, url,
                                                       last_use_time)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(share_id, item_id, url) DO UPDATE SET
                       username=excluded.username,
                       last_use_time=excluded.last_use_time",
                    params![
                        credential.share_id,
                        credential.item_id,
                        credential.username,
                        credential.url,
                        credential.last_use_time,
                    ],
                )?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => tx.commit().map_err(|e| Error::BatchInsert(e.to_string())),
            Err(e) => Err(Error::BatchInsert(e.to_string())),
        }
    }

    /// Remove specific credential rows (used when a login item is edited)
    pub fn remove_credentials(&self, credentials: &[AutoFillCredential]) -> Result<()> {
        if credentials.is_empty() {
            return Ok(());
        }
        let mut conn = self.db.lock();
        let tx = conn.transaction()?;
        for credential in credentials {
            tx.execute(
                "DELETE FROM autofill_credentials
                 WHERE share_id = ?1 AND item_id = ?2 AND url = ?3",
                params![credential.share_id, credential.item_id, credential.url],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove every ranking row (full re-population path)
    pub fn remove_all(&self) -> Result<()> {
        let conn = self.db.lock();
        let removed = conn.execute("DELETE FROM autofill_credentials", [])?;
        tracing::debug!("Removed {} autofill credential rows", removed);
        Ok(())
    }

    /// Ranking rows for one item, order unspecified
    pub fn fetch_for_item(&self, share_id: &str, item_id: &str) -> Result<Vec<AutoFillCredential>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT username, url, last_use_time
             FROM autofill_credentials WHERE share_id = ?1 AND item_id = ?2",
        )?;
        let rows = stmt.query_map(params![share_id, item_id], |row| {
            Ok(AutoFillCredential {
                share_id: share_id.to_string(),
                item_id: item_id.to_string(),
                username: row.get(0)?,
                url: row.get(1)?,
                last_use_time: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{EncryptionAlgorithm, MasterKey};

    fn database() -> Arc<Database> {
        Arc::new(
            Database::open_in_memory(MasterKey::generate(EncryptionAlgorithm::AesGcm)).unwrap(),
        )
    }

    fn share(share_id: &str) -> Share {
        Share {
            share_id: share_id.to_string(),
            address_id: "address-1".to_string(),
            target_type: ShareTargetType::Vault,
            target_id: "vault-1".to_string(),
            role: ShareRole::Admin,
            content: Some("ZW5jcnlwdGVkIGNvbnRlbnQ=".to_string()),
            content_key_rotation: Some(1),
            content_format_version: Some(1),
            member_count: 1,
            create_time: 1_700_000_000,
            expire_time: None,
        }
    }

    fn share_key(rotation: u32) -> ShareKey {
        ShareKey {
            key_rotation: rotation,
            key: format!("encrypted-key-material-{rotation}"),
            user_key_id: "address-1".to_string(),
            create_time: 1_700_000_000,
        }
    }

    #[test]
    fn test_insert_and_fetch_round_trip() {
        let db = database();
        let datasource = LocalShareDatasource::new(db);

        datasource
            .insert_shares(&[share("share-1"), share("share-2")], "user-1")
            .unwrap();

        let mut fetched = datasource.fetch_shares("user-1").unwrap();
        fetched.sort_by(|a, b| a.share_id.cmp(&b.share_id));
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].share_id, "share-1");
        assert_eq!(
            fetched[0].content.as_deref(),
            Some("ZW5jcnlwdGVkIGNvbnRlbnQ=")
        );
    }

    #[test]
    fn test_shares_are_user_scoped() {
        let db = database();
        let datasource = LocalShareDatasource::new(db);

        datasource.insert_shares(&[share("share-1")], "u1").unwrap();
        assert!(datasource.fetch_shares("u2").unwrap().is_empty());
    }

    #[test]
    fn test_empty_user_id_skips_the_store() {
        let db = database();
        let datasource = LocalShareDatasource::new(db.clone());

        // Drop the table: a real query would now fail, proving the empty
        // user id path never reaches sqlite.
        db.lock().execute_batch("DROP TABLE shares").unwrap();
        assert!(datasource.fetch_shares("").unwrap().is_empty());
        assert!(datasource.fetch_shares("user-1").is_err());
    }

    #[test]
    fn test_empty_batch_is_a_no_op() {
        let db = database();
        let datasource = LocalShareDatasource::new(db);
        datasource.insert_shares(&[], "user-1").unwrap();
        assert!(datasource.fetch_shares("user-1").unwrap().is_empty());
    }

    #[test]
    fn test_upsert_replaces_by_identity() {
        let db = database();
        let datasource = LocalShareDatasource::new(db);

        datasource.insert_shares(&[share("share-1")], "user-1").unwrap();
        let mut updated = share("share-1");
        updated.member_count = 5;
        datasource.insert_shares(&[updated], "user-1").unwrap();

        let fetched = datasource.fetch_shares("user-1").unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].member_count, 5);
    }

    #[test]
    fn test_remove_all_shares() {
        let db = database();
        let datasource = LocalShareDatasource::new(db);

        datasource
            .insert_shares(&[share("share-1")], "user-1")
            .unwrap();
        datasource
            .insert_shares(&[share("share-1")], "user-2")
            .unwrap();
        datasource.remove_all_shares("user-1").unwrap();

        assert!(datasource.fetch_shares("user-1").unwrap().is_empty());
        assert_eq!(datasource.fetch_shares("user-2").unwrap().len(), 1);
    }

    #[test]
    fn test_share_key_pagination() {
        let db = database();
        let datasource = LocalShareKeyDatasource::new(db);

        let keys: Vec<ShareKey> = (0..5).map(share_key).collect();
        datasource.insert_share_keys("share-1", &keys).unwrap();

        let page0 = datasource.fetch_share_keys("share-1", 0, 2).unwrap();
        assert_eq!(
            page0.iter().map(|k| k.key_rotation).collect::<Vec<_>>(),
            vec![0, 1]
        );

        let page2 = datasource.fetch_share_keys("share-1", 2, 2).unwrap();
        assert_eq!(
            page2.iter().map(|k| k.key_rotation).collect::<Vec<_>>(),
            vec![4]
        );

        assert!(datasource.fetch_share_keys("share-1", 3, 2).unwrap().is_empty());
        assert!(datasource.fetch_share_keys("share-2", 0, 2).unwrap().is_empty());
    }

    #[test]
    fn test_share_key_round_trips_through_field_encryption() {
        let db = database();
        let datasource = LocalShareKeyDatasource::new(db.clone());

        datasource
            .insert_share_keys("share-1", &[share_key(7)])
            .unwrap();

        // The raw column must not contain the plaintext key material.
        let raw: Vec<u8> = db
            .lock()
            .query_row("SELECT key FROM share_keys", [], |row| row.get(0))
            .unwrap();
        assert_ne!(raw, share_key(7).key.as_bytes());

        let fetched = datasource.fetch_share_keys("share-1", 0, 10).unwrap();
        assert_eq!(fetched[0].key, share_key(7).key);
    }

    #[test]
    fn test_credential_insert_fetch_and_remove_all() {
        let db = database();
        let datasource = LocalCredentialDatasource::new(db);

        let credential = AutoFillCredential {
            share_id: "share-1".to_string(),
            item_id: "item-1".to_string(),
            username: "user@example.com".to_string(),
            url: "https://example.com/login".to_string(),
            last_use_time: 1_700_000_000,
        };
        datasource.insert_credentials(&[credential.clone()]).unwrap();

        let fetched = datasource.fetch_for_item("share-1", "item-1").unwrap();
        assert_eq!(fetched, vec![credential.clone()]);

        datasource.remove_all().unwrap();
        assert!(datasource.fetch_for_item("share-1", "item-1").unwrap().is_empty());
    }

    #[test]
    fn test_credential_upsert_updates_last_use_time() {
        let db = database();
        let datasource = LocalCredentialDatasource::new(db);

        let mut credential = AutoFillCredential {
            share_id: "share-1".to_string(),
            item_id: "item-1".to_string(),
            username: "user@example.com".to_string(),
            url: "https://example.com".to_string(),
            last_use_time: 100,
        };
        datasource.insert_credentials(&[credential.clone()]).unwrap();
        credential.last_use_time = 200;
        datasource.insert_credentials(&[credential]).unwrap();

        let fetched = datasource.fetch_for_item("share-1", "item-1").unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].last_use_time, 200);
    }
}
