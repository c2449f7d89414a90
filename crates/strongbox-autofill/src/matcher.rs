//! URL matching heuristics
//!
//! Decides whether a login item's stored URL should be offered for an OS
//! service identifier. Matching is deliberately tolerant of scheme and
//! subdomain variance: `https://a.example.com/login` should be offered
//! when the identifier says `a.example.com`.

use http::Uri;

const EXACT_HOST_SCORE: u32 = 1000;
const SUBDOMAIN_SCORE: u32 = 500;

/// Outcome of comparing an item URL against a service URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlMatch {
    /// The URLs refer to the same service; higher score is a closer match
    Matched(u32),
    /// Unrelated URLs
    NotMatched,
    /// Same registrable domain but sibling hosts; not offered by default
    Ambiguous,
}

impl UrlMatch {
    /// Whether this outcome counts as a match
    pub fn is_matched(&self) -> bool {
        matches!(self, UrlMatch::Matched(_))
    }
}

/// Compare a login item URL against a normalized service URL
pub fn match_urls(item_url: &Uri, service_url: &Uri) -> UrlMatch {
    let (Some(item_host), Some(service_host)) = (item_url.host(), service_url.host()) else {
        return UrlMatch::NotMatched;
    };
    let item_host = item_host.to_ascii_lowercase();
    let service_host = service_host.to_ascii_lowercase();

    // http and https are interchangeable; any other scheme must match
    // exactly (an androidapp:// identifier never matches a web URL).
    let item_scheme = item_url.scheme_str().unwrap_or("https");
    let service_scheme = service_url.scheme_str().unwrap_or("https");
    if !(is_web_scheme(item_scheme) && is_web_scheme(service_scheme))
        && item_scheme != service_scheme
    {
        return UrlMatch::NotMatched;
    }

    if item_host == service_host {
        return UrlMatch::Matched(EXACT_HOST_SCORE);
    }
    if is_subdomain(&item_host, &service_host) || is_subdomain(&service_host, &item_host) {
        return UrlMatch::Matched(SUBDOMAIN_SCORE);
    }
    if apex_domain(&item_host) == apex_domain(&service_host) && apex_domain(&item_host).is_some() {
        return UrlMatch::Ambiguous;
    }
    UrlMatch::NotMatched
}

fn is_web_scheme(scheme: &str) -> bool {
    scheme == "http" || scheme == "https"
}

fn is_subdomain(child: &str, parent: &str) -> bool {
    child.len() > parent.len() && child.ends_with(parent) && {
        let boundary = child.len() - parent.len();
        child.as_bytes()[boundary - 1] == b'.'
    }
}

/// Last two labels of a hostname; `None` for bare single-label hosts
fn apex_domain(host: &str) -> Option<String> {
    let labels: Vec<&str> = host.rsplitn(3, '.').collect();
    if labels.len() < 2 {
        return None;
    }
    Some(format!("{}.{}", labels[1], labels[0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_exact_host_matches() {
        assert_eq!(
            match_urls(&uri("https://example.com/login"), &uri("https://example.com")),
            UrlMatch::Matched(EXACT_HOST_SCORE)
        );
    }

    #[test]
    fn test_scheme_variance_tolerated_for_web() {
        assert!(match_urls(&uri("http://example.com"), &uri("https://example.com")).is_matched());
    }

    #[test]
    fn test_subdomain_matches_either_direction() {
        assert!(match_urls(
            &uri("https://login.example.com"),
            &uri("https://example.com")
        )
        .is_matched());
        assert!(match_urls(
            &uri("https://example.com"),
            &uri("https://login.example.com")
        )
        .is_matched());
    }

    #[test]
    fn test_sibling_subdomains_are_ambiguous() {
        assert_eq!(
            match_urls(&uri("https://a.example.com"), &uri("https://b.example.com")),
            UrlMatch::Ambiguous
        );
    }

    #[test]
    fn test_unrelated_hosts_do_not_match() {
        assert_eq!(
            match_urls(&uri("https://example.com"), &uri("https://example.org")),
            UrlMatch::NotMatched
        );
    }

    #[test]
    fn test_host_suffix_without_label_boundary_is_not_a_subdomain() {
        assert_eq!(
            match_urls(&uri("https://notexample.com"), &uri("https://example.com")),
            UrlMatch::NotMatched
        );
    }

    #[test]
    fn test_non_web_scheme_requires_exact_scheme() {
        assert_eq!(
            match_urls(&uri("ftp://example.com"), &uri("https://example.com")),
            UrlMatch::NotMatched
        );
        assert!(match_urls(&uri("ftp://example.com"), &uri("ftp://example.com")).is_matched());
    }

    #[test]
    fn test_host_comparison_is_case_insensitive() {
        assert!(match_urls(&uri("https://Example.COM"), &uri("https://example.com")).is_matched());
    }

    proptest! {
        #[test]
        fn prop_every_url_matches_itself(host in "[a-z]{1,12}(\\.[a-z]{1,12}){1,3}") {
            let url: Uri = format!("https://{host}/login").parse().unwrap();
            prop_assert_eq!(match_urls(&url, &url), UrlMatch::Matched(EXACT_HOST_SCORE));
        }

        #[test]
        fn prop_matching_is_symmetric(
            a in "[a-z]{1,8}(\\.[a-z]{1,8}){1,2}",
            b in "[a-z]{1,8}(\\.[a-z]{1,8}){1,2}",
        ) {
            let left: Uri = format!("https://{a}").parse().unwrap();
            let right: Uri = format!("https://{b}").parse().unwrap();
            prop_assert_eq!(
                match_urls(&left, &right).is_matched(),
                match_urls(&right, &left).is_matched()
            );
        }
    }
}
