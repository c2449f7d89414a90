//! Remote sync for the Strongbox vault engine
//!
//! Authenticated JSON transport, the remote share datasource with
//! concurrent detail fan-out, and the cache-aside share repository that
//! reconciles the local cache against the remote source of truth.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod endpoints;
pub mod error;
pub mod remote;
pub mod repository;
pub mod transport;

pub use config::EnvironmentConfig;
pub use error::{Error, Result};
pub use remote::RemoteDatasource;
pub use repository::ShareRepository;
pub use transport::{ApiRequest, ApiTransport, HttpTransport, RetryConfig};
