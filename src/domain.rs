//! Public-suffix aware host classification.
//!
//! Everything here answers one question: does a URL belong to the site being
//! crawled? A URL's *registrable domain* (public suffix plus one label,
//! `example.co.uk` for `https://blog.example.co.uk/about`) is compared against
//! the crawl's base domain. URLs that cannot be parsed or carry no host
//! classify as external, so the crawler never follows them into a body fetch.

use url::Url;

/// Extracts the registrable domain of a URL, lowercased.
///
/// Returns `None` when the URL cannot be parsed or has no host. Hosts the
/// public-suffix list cannot decompose (single-label hosts such as
/// `localhost`) fall back to the full host so every URL of such a site still
/// classifies consistently.
pub fn registrable_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match psl::domain_str(host) {
        Some(domain) => Some(domain.to_ascii_lowercase()),
        None => Some(host.to_ascii_lowercase()),
    }
}

/// Canonical origin of a parsed URL, e.g. `https://example.com`.
pub fn base_site(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// True when `url` does not belong to `base_domain`.
///
/// The comparison is an exact registrable-domain match: `notexample.com` is
/// external to `example.com`, and so is any URL whose domain cannot be
/// determined.
pub fn is_external(url: &str, base_domain: &str) -> bool {
    match registrable_domain(url) {
        Some(domain) => domain != base_domain,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_subdomains_to_the_registrable_domain() {
        assert_eq!(
            registrable_domain("https://blog.example.com/post/1"),
            Some("example.com".to_string())
        );
        assert_eq!(
            registrable_domain("http://a.b.example.co.uk/"),
            Some("example.co.uk".to_string())
        );
    }

    #[test]
    fn lowercases_the_domain() {
        assert_eq!(
            registrable_domain("https://WWW.Example.COM/"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn urls_without_a_host_have_no_domain() {
        assert_eq!(registrable_domain("not a url"), None);
        assert_eq!(registrable_domain("mailto:someone@example.com"), None);
    }

    #[test]
    fn single_label_hosts_fall_back_to_the_full_host() {
        assert_eq!(
            registrable_domain("http://localhost:8080/x"),
            Some("localhost".to_string())
        );
    }

    #[test]
    fn lookalike_hosts_are_external() {
        assert!(is_external("https://notexample.com/", "example.com"));
        assert!(is_external("https://example.com.evil.net/", "example.com"));
        assert!(!is_external("https://docs.example.com/api", "example.com"));
    }

    #[test]
    fn unclassifiable_urls_are_external() {
        assert!(is_external("javascript:void(0)", "example.com"));
    }

    #[test]
    fn base_site_is_the_origin() {
        let url = Url::parse("https://shop.example.com:8443/cart?x=1#f").unwrap();
        assert_eq!(base_site(&url), "https://shop.example.com:8443");

        let url = Url::parse("http://example.com/a/b").unwrap();
        assert_eq!(base_site(&url), "http://example.com");
    }
}
