//! Database connection and initialization

use crate::{migrations, security::MasterKey, Result};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// Database connection wrapper
///
/// Cache operations lock the connection for the duration of one logical
/// operation, so concurrent callers never observe each other's partial
/// writes.
pub struct Database {
    conn: Mutex<Connection>,
    master_key: MasterKey,
}

impl Database {
    /// Open the database at `path`, creating it and running migrations if
    /// needed
    pub fn open<P: AsRef<Path>>(path: P, master_key: MasterKey) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::init(conn, master_key)
    }

    /// Open an in-memory database (tests and ephemeral sessions)
    pub fn open_in_memory(master_key: MasterKey) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, master_key)
    }

    fn init(conn: Connection, master_key: MasterKey) -> Result<Self> {
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            master_key,
        })
    }

    /// Lock the connection for one logical operation
    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Master key for field-level encryption
    pub fn master_key(&self) -> &MasterKey {
        &self.master_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::EncryptionAlgorithm;
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_database() {
        let file = NamedTempFile::new().unwrap();
        let master_key = MasterKey::generate(EncryptionAlgorithm::AesGcm);
        assert!(Database::open(file.path(), master_key).is_ok());
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let file = NamedTempFile::new().unwrap();
        let master_key = MasterKey::generate(EncryptionAlgorithm::AesGcm);
        drop(Database::open(file.path(), master_key.clone()).unwrap());
        assert!(Database::open(file.path(), master_key).is_ok());
    }
}
