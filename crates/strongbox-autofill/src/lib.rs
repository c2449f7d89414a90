//! Autofill support for the Strongbox vault engine
//!
//! Normalizes heterogeneous OS credential requests into one internal
//! shape, matches login item URLs against OS service identifiers, and
//! maintains the ranking rows the OS credential picker reads.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod matcher;
pub mod rank;
pub mod request;
pub mod service_identifier;

pub use error::{Error, Result};
pub use matcher::{match_urls, UrlMatch};
pub use rank::UpdateCredentialRank;
pub use request::{
    normalize, AutoFillMode, AutoFillRequest, OneTimeCodeIdentity, OsCredentialRequest,
    PasskeyIdentity, PasswordIdentity, PlatformIdentity,
};
pub use service_identifier::{ServiceIdentifier, ServiceIdentifierKind};
