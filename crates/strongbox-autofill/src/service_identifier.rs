//! OS service identifier normalization
//!
//! The OS hands over the context of an autofill request as a list of
//! service identifiers, each tagged with how the identifier should be
//! read. Tag values the engine does not recognize are treated as verbatim
//! URLs so that a newer OS does not break matching outright.

use http::Uri;
use tracing::warn;

/// How the OS tagged an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceIdentifierKind {
    /// A bare domain, e.g. `accounts.example.com`
    Domain,
    /// A full URL
    Url,
    /// A tag value this engine does not know yet
    Other(String),
}

/// One service identifier from an OS credential request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentifier {
    /// The raw identifier string
    pub identifier: String,
    /// How to interpret it
    pub kind: ServiceIdentifierKind,
}

impl ServiceIdentifier {
    /// A domain-tagged identifier
    pub fn domain(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            kind: ServiceIdentifierKind::Domain,
        }
    }

    /// A URL-tagged identifier
    pub fn url(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            kind: ServiceIdentifierKind::Url,
        }
    }

    /// Normalize to a comparable URL.
    ///
    /// Domain identifiers get an `https://` prefix; URL identifiers are
    /// used verbatim; unknown tags fall back to verbatim. Identifiers
    /// that do not parse to a URL with a host yield `None` and are
    /// silently dropped by the caller.
    pub fn to_service_url(&self) -> Option<Uri> {
        let raw = match &self.kind {
            ServiceIdentifierKind::Domain => format!("https://{}", self.identifier),
            ServiceIdentifierKind::Url => self.identifier.clone(),
            ServiceIdentifierKind::Other(tag) => {
                warn!(
                    "Unexpected service identifier tag {:?}, treating identifier verbatim",
                    tag
                );
                self.identifier.clone()
            }
        };
        let uri: Uri = raw.parse().ok()?;
        uri.host()?;
        Some(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_gets_https_prefix() {
        let uri = ServiceIdentifier::domain("a.example.com")
            .to_service_url()
            .unwrap();
        assert_eq!(uri.scheme_str(), Some("https"));
        assert_eq!(uri.host(), Some("a.example.com"));
    }

    #[test]
    fn test_url_used_verbatim() {
        let uri = ServiceIdentifier::url("http://example.com/login")
            .to_service_url()
            .unwrap();
        assert_eq!(uri.scheme_str(), Some("http"));
        assert_eq!(uri.path(), "/login");
    }

    #[test]
    fn test_unknown_tag_falls_back_to_verbatim() {
        let identifier = ServiceIdentifier {
            identifier: "https://example.com".to_string(),
            kind: ServiceIdentifierKind::Other("futureTag".to_string()),
        };
        assert!(identifier.to_service_url().is_some());
    }

    #[test]
    fn test_unparsable_identifier_yields_none() {
        assert!(ServiceIdentifier::url("not a url at all").to_service_url().is_none());
        assert!(ServiceIdentifier::domain("").to_service_url().is_none());
    }
}
