// Decides how an inbound host should be looked up in the catalog. The
// branching is kept as a pure function so it can be tested without any I/O.

use http::HeaderMap;
use http::header::HOST;
use shared::host::normalize_host;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostLookup {
    /// `{slug}.{base_domain}` — resolve through the slug registry.
    BySlug(String),
    /// Anything else — resolve through verified custom-domain mappings.
    ByCustomDomain(String),
}

/// Extracts and normalizes the `Host` header. Missing, unreadable, or
/// empty values all come back as `None`.
pub fn host_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(HOST)?.to_str().ok()?;
    let host = normalize_host(raw);
    if host.is_empty() { None } else { Some(host) }
}

/// Classifies a normalized host against the configured base domain.
///
/// A host counts as slug-style only when exactly one label precedes the
/// base domain: `acme.quackback.io` yields `BySlug("acme")`, while
/// `feedback.acme.quackback.io` and `quackback.io` itself fall through to
/// the custom-domain path.
pub fn classify_host(host: &str, base_domain: &str) -> HostLookup {
    let suffix = format!(".{base_domain}");
    if let Some(prefix) = host.strip_suffix(suffix.as_str())
        && !prefix.is_empty()
        && !prefix.contains('.')
    {
        return HostLookup::BySlug(prefix.to_string());
    }

    HostLookup::ByCustomDomain(host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn slug_host_classifies_by_slug() {
        assert_eq!(
            classify_host("acme.quackback.io", "quackback.io"),
            HostLookup::BySlug("acme".into())
        );
    }

    #[test]
    fn foreign_host_classifies_as_custom_domain() {
        assert_eq!(
            classify_host("feedback.customer.com", "quackback.io"),
            HostLookup::ByCustomDomain("feedback.customer.com".into())
        );
    }

    #[test]
    fn nested_subdomain_is_not_a_slug() {
        assert_eq!(
            classify_host("feedback.acme.quackback.io", "quackback.io"),
            HostLookup::ByCustomDomain("feedback.acme.quackback.io".into())
        );
    }

    #[test]
    fn bare_base_domain_is_not_a_slug() {
        assert_eq!(
            classify_host("quackback.io", "quackback.io"),
            HostLookup::ByCustomDomain("quackback.io".into())
        );
    }

    #[test]
    fn host_header_is_normalized() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("Acme.Quackback.IO:443"));

        assert_eq!(
            host_from_headers(&headers).as_deref(),
            Some("acme.quackback.io")
        );
    }

    #[test]
    fn missing_host_header_is_none() {
        let headers = HeaderMap::new();
        assert_eq!(host_from_headers(&headers), None);
    }
}
