//! OS credential request normalization
//!
//! The OS surfaces several request shapes with their own payload types.
//! They collapse here into one tagged union with uniform accessors; the
//! rest of the engine never sees platform types. Normalization is a
//! one-shot classification, not a state machine.

use tracing::{trace, warn};

use crate::service_identifier::ServiceIdentifier;
use crate::{Error, Result};

/// Identity payload of a password request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordIdentity {
    /// Opaque record identifier for the stored credential, if any
    pub record_identifier: Option<String>,
    /// Service identifiers describing the requesting context
    pub service_identifiers: Vec<ServiceIdentifier>,
}

/// Identity payload of a passkey assertion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasskeyIdentity {
    /// Opaque record identifier for the stored credential, if any
    pub record_identifier: Option<String>,
    /// Service identifiers describing the requesting context
    pub service_identifiers: Vec<ServiceIdentifier>,
    /// Relying party the assertion is for
    pub relying_party_id: String,
    /// Credential id requested by the relying party
    pub credential_id: Vec<u8>,
}

/// Identity payload of a one-time-code request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneTimeCodeIdentity {
    /// Opaque record identifier for the stored credential, if any
    pub record_identifier: Option<String>,
    /// Service identifiers describing the requesting context
    pub service_identifiers: Vec<ServiceIdentifier>,
}

/// The platform payload carried by an OS request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformIdentity {
    /// Password credential identity
    Password(PasswordIdentity),
    /// Passkey credential identity
    Passkey(PasskeyIdentity),
    /// One-time-code credential identity
    OneTimeCode(OneTimeCodeIdentity),
}

impl PlatformIdentity {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Password(_) => "password",
            Self::Passkey(_) => "passkey",
            Self::OneTimeCode(_) => "one-time-code",
        }
    }
}

/// An incoming OS credential request, as the platform hands it over
#[derive(Debug, Clone)]
pub enum OsCredentialRequest {
    /// Password autofill
    Password {
        /// Platform identity payload; must be a password identity
        identity: PlatformIdentity,
    },
    /// Passkey assertion
    PasskeyAssertion {
        /// Platform identity payload; must be a passkey identity
        identity: PlatformIdentity,
    },
    /// One-time code autofill
    OneTimeCode {
        /// Platform identity payload; must be a one-time-code identity
        identity: PlatformIdentity,
    },
    /// Passkey registration; not supported by this engine
    PasskeyRegistration,
    /// A request kind this engine does not recognize
    Unknown {
        /// Platform name of the unrecognized kind
        kind: String,
    },
}

/// Normalized autofill request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoFillRequest {
    /// Fill a password credential
    Password(PasswordIdentity),
    /// Assert a passkey
    Passkey(PasskeyIdentity),
    /// Fill a one-time code
    OneTimeCode(OneTimeCodeIdentity),
}

impl AutoFillRequest {
    /// Uniform accessor for the stored-credential record identifier
    pub fn record_identifier(&self) -> Option<&str> {
        match self {
            Self::Password(identity) => identity.record_identifier.as_deref(),
            Self::Passkey(identity) => identity.record_identifier.as_deref(),
            Self::OneTimeCode(identity) => identity.record_identifier.as_deref(),
        }
    }

    /// Uniform accessor for the requesting context
    pub fn service_identifiers(&self) -> &[ServiceIdentifier] {
        match self {
            Self::Password(identity) => &identity.service_identifiers,
            Self::Passkey(identity) => &identity.service_identifiers,
            Self::OneTimeCode(identity) => &identity.service_identifiers,
        }
    }
}

/// Normalize an OS request into the internal shape.
///
/// `Ok(None)` means the request kind is not supported (passkey
/// registration, unknown kinds) and the caller must bail out gracefully.
/// A recognized kind whose payload is not the expected identity type is a
/// platform contract violation and fails with
/// [`Error::UnexpectedPayload`].
pub fn normalize(request: OsCredentialRequest) -> Result<Option<AutoFillRequest>> {
    match request {
        OsCredentialRequest::Password { identity } => match identity {
            PlatformIdentity::Password(identity) => Ok(Some(AutoFillRequest::Password(identity))),
            other => Err(Error::UnexpectedPayload(format!(
                "password request carried a {} identity",
                other.kind_name()
            ))),
        },
        OsCredentialRequest::PasskeyAssertion { identity } => match identity {
            PlatformIdentity::Passkey(identity) => Ok(Some(AutoFillRequest::Passkey(identity))),
            other => Err(Error::UnexpectedPayload(format!(
                "passkey assertion carried a {} identity",
                other.kind_name()
            ))),
        },
        OsCredentialRequest::OneTimeCode { identity } => match identity {
            PlatformIdentity::OneTimeCode(identity) => {
                Ok(Some(AutoFillRequest::OneTimeCode(identity)))
            }
            other => Err(Error::UnexpectedPayload(format!(
                "one-time-code request carried a {} identity",
                other.kind_name()
            ))),
        },
        OsCredentialRequest::PasskeyRegistration => {
            trace!("Passkey registration is not supported");
            Ok(None)
        }
        OsCredentialRequest::Unknown { kind } => {
            warn!("Unrecognized credential request kind {:?}", kind);
            Ok(None)
        }
    }
}

/// How the autofill flow should proceed for a normalized request.
///
/// Whether local authentication is required is external policy state; the
/// mode only records the outcome of that decision next to the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoFillMode {
    /// Fill right away
    AutoFillImmediately(AutoFillRequest),
    /// Run local authentication first, then fill
    AuthenticateThenAutoFill(AutoFillRequest),
}

impl AutoFillMode {
    /// Choose the mode for a request
    pub fn decide(request: AutoFillRequest, local_authentication_required: bool) -> Self {
        if local_authentication_required {
            Self::AuthenticateThenAutoFill(request)
        } else {
            Self::AutoFillImmediately(request)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn password_identity() -> PasswordIdentity {
        PasswordIdentity {
            record_identifier: Some("record-1".to_string()),
            service_identifiers: vec![ServiceIdentifier::domain("example.com")],
        }
    }

    fn otp_identity() -> OneTimeCodeIdentity {
        OneTimeCodeIdentity {
            record_identifier: None,
            service_identifiers: vec![ServiceIdentifier::url("https://example.com/2fa")],
        }
    }

    #[test]
    fn test_password_request_normalizes() {
        let request = OsCredentialRequest::Password {
            identity: PlatformIdentity::Password(password_identity()),
        };
        let normalized = normalize(request).unwrap().unwrap();
        assert_eq!(normalized.record_identifier(), Some("record-1"));
        assert_eq!(normalized.service_identifiers().len(), 1);
    }

    #[test]
    fn test_passkey_registration_is_unsupported() {
        assert!(normalize(OsCredentialRequest::PasskeyRegistration)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unknown_kind_is_unsupported() {
        let request = OsCredentialRequest::Unknown {
            kind: "futureRequestKind".to_string(),
        };
        assert!(normalize(request).unwrap().is_none());
    }

    #[test]
    fn test_mismatched_payload_fails() {
        let request = OsCredentialRequest::Password {
            identity: PlatformIdentity::OneTimeCode(otp_identity()),
        };
        assert!(matches!(
            normalize(request),
            Err(Error::UnexpectedPayload(_))
        ));
    }

    #[test]
    fn test_one_time_code_request_normalizes() {
        let request = OsCredentialRequest::OneTimeCode {
            identity: PlatformIdentity::OneTimeCode(otp_identity()),
        };
        let normalized = normalize(request).unwrap().unwrap();
        assert_eq!(normalized.record_identifier(), None);
    }

    #[test]
    fn test_mode_follows_local_authentication_flag() {
        let request = AutoFillRequest::Password(password_identity());
        assert!(matches!(
            AutoFillMode::decide(request.clone(), true),
            AutoFillMode::AuthenticateThenAutoFill(_)
        ));
        assert!(matches!(
            AutoFillMode::decide(request, false),
            AutoFillMode::AutoFillImmediately(_)
        ));
    }
}
