//! Database schema migrations

use crate::{Error, Result};
use rusqlite::Connection;

const SCHEMA_VERSION: i32 = 2;

/// Run all migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    tracing::debug!(
        "Running migrations: current_version={}, target_version={}",
        current_version,
        SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    if current_version < 2 {
        migrate_v2(conn)?;
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32> {
    let version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| Error::Migration(format!("Failed to read schema version: {e}")))?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute_batch(&format!("PRAGMA user_version = {version}"))
        .map_err(|e| Error::Migration(format!("Failed to set schema version: {e}")))?;
    Ok(())
}

/// Shares and share keys
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS shares (
            user_id TEXT NOT NULL,
            share_id TEXT NOT NULL,
            address_id TEXT NOT NULL,
            target_type INTEGER NOT NULL,
            target_id TEXT NOT NULL,
            role INTEGER NOT NULL,
            content BLOB,
            content_key_rotation INTEGER,
            content_format_version INTEGER,
            member_count INTEGER NOT NULL,
            create_time INTEGER NOT NULL,
            expire_time INTEGER,
            PRIMARY KEY (user_id, share_id)
        );

        CREATE TABLE IF NOT EXISTS share_keys (
            share_id TEXT NOT NULL,
            key_rotation INTEGER NOT NULL,
            key BLOB NOT NULL,
            user_key_id TEXT NOT NULL,
            create_time INTEGER NOT NULL,
            PRIMARY KEY (share_id, key_rotation)
        );
        "#,
    )
    .map_err(|e| Error::Migration(format!("v1 failed: {e}")))?;
    Ok(())
}

/// Autofill credential ranking projection
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS autofill_credentials (
            share_id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            username TEXT NOT NULL,
            url TEXT NOT NULL,
            last_use_time INTEGER NOT NULL,
            PRIMARY KEY (share_id, item_id, url)
        );

        CREATE INDEX IF NOT EXISTS idx_autofill_credentials_url
            ON autofill_credentials (url);
        "#,
    )
    .map_err(|e| Error::Migration(format!("v2 failed: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_run_from_empty() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN
                 ('shares', 'share_keys', 'autofill_credentials')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }
}
