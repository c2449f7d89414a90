//! Encrypted SQLite cache for the Strongbox vault engine
//!
//! Durable on-device store of shares, share keys, and autofill credential
//! rankings. Sensitive columns are field-encrypted with a session-scoped
//! master key before they touch the database file.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod database;
pub mod datasource;
pub mod error;
pub mod migrations;
pub mod security;

pub use database::Database;
pub use datasource::{LocalCredentialDatasource, LocalShareDatasource, LocalShareKeyDatasource};
pub use error::{Error, Result};
pub use security::{EncryptionAlgorithm, MasterKey};
