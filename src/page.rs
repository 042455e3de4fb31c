//! # Page Module
//!
//! Defines the [`Page`] entity and the identity rules that decide when two
//! URLs are the same page.
//!
//! ## Overview
//!
//! A `Page` is created the moment a URL is discovered, as the seed or as a
//! link on a fetched body, and is classified right there: its identity key is
//! normalized and its external flag is computed against the crawl's base
//! domain. The request pipeline later fills in status code, content type,
//! children and errors while it exclusively owns the page. Identity never
//! changes after construction; two pages with equal keys are the same page no
//! matter how their raw hrefs were spelled.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use url::Url;

use crate::config::CrawlConfig;
use crate::domain;
use crate::error::CrawlError;

/// Content type recorded for pages whose requests failed.
pub const CONTENT_TYPE_UNKNOWN: &str = "UNKNOWN";

/// Content type assumed for a page until a response says otherwise.
pub const CONTENT_TYPE_DEFAULT: &str = "text/html";

/// How the `http`/`https` distinction affects page identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemePolicy {
    /// `http` and `https` variants of a URL are the same page.
    #[default]
    Collapse,
    /// The scheme is part of the identity; the variants stay distinct.
    Distinct,
}

/// Crawl-wide site identity, shared by every page of a run.
#[derive(Debug)]
pub struct SiteContext {
    /// Registrable domain the crawl belongs to, e.g. `example.com`.
    pub base_domain: String,
    /// Canonical origin of the seed, e.g. `https://example.com`.
    pub base_site: String,
    /// Registrable domains classified external even when they match the base.
    pub always_external: Vec<String>,
    /// Identity treatment of the `http`/`https` split.
    pub scheme_policy: SchemePolicy,
}

impl SiteContext {
    /// Derives the site context for a crawl seeded at `seed`.
    pub(crate) fn for_seed(seed: &Url, config: &CrawlConfig) -> Result<Self, CrawlError> {
        let base_domain = match &config.base_domain {
            Some(domain) => domain.to_ascii_lowercase(),
            None => domain::registrable_domain(seed.as_str()).ok_or_else(|| {
                CrawlError::Configuration(format!(
                    "cannot derive a base domain from seed URL `{seed}`"
                ))
            })?,
        };
        Ok(Self {
            base_domain,
            base_site: domain::base_site(seed),
            always_external: config
                .always_external
                .iter()
                .map(|domain| domain.to_ascii_lowercase())
                .collect(),
            scheme_policy: config.scheme_policy,
        })
    }

    /// Classifies a URL against this site.
    pub fn is_external(&self, url: &str) -> bool {
        match domain::registrable_domain(url) {
            Some(domain) => domain != self.base_domain || self.always_external.contains(&domain),
            None => true,
        }
    }
}

/// Normalized page identity.
///
/// Host, non-default port, path and query, with the fragment dropped and the
/// scheme folded per [`SchemePolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey(String);

impl PageKey {
    pub(crate) fn from_url(url: &Url, policy: SchemePolicy) -> Self {
        let scheme = match policy {
            SchemePolicy::Collapse if url.scheme() == "https" => "http",
            _ => url.scheme(),
        };
        let mut key = String::with_capacity(url.as_str().len());
        key.push_str(scheme);
        key.push_str("://");
        key.push_str(url.host_str().unwrap_or(""));
        if let Some(port) = url.port() {
            key.push(':');
            key.push_str(&port.to_string());
        }
        key.push_str(url.path());
        if let Some(query) = url.query() {
            key.push('?');
            key.push_str(query);
        }
        PageKey(key)
    }

    /// The normalized form as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One discovered URL and everything the crawl learned about it.
#[derive(Debug, Clone)]
pub struct Page {
    url: Url,
    key: PageKey,
    parent: Option<String>,
    external: bool,
    visited: bool,
    site: Arc<SiteContext>,
    /// Final HTTP status; `None` before any response and after transport
    /// failures.
    pub status: Option<u16>,
    /// Content type reported by the server, [`CONTENT_TYPE_UNKNOWN`] once a
    /// request for this page has failed.
    pub content_type: String,
    /// Absolute URLs of the links found on this page's body.
    pub children: BTreeSet<String>,
    /// Findings recorded against this page by a browser probe.
    pub errors: Vec<String>,
}

impl Page {
    /// Creates a page for a parsed URL, classifying it immediately.
    ///
    /// The fragment is dropped before anything else looks at the URL, so two
    /// hrefs differing only in fragment produce equal pages.
    pub fn from_url(mut url: Url, parent: Option<&str>, site: &Arc<SiteContext>) -> Self {
        url.set_fragment(None);
        let key = PageKey::from_url(&url, site.scheme_policy);
        let external = site.is_external(url.as_str());
        Self {
            url,
            key,
            parent: parent.map(str::to_string),
            external,
            visited: false,
            site: Arc::clone(site),
            status: None,
            content_type: CONTENT_TYPE_DEFAULT.to_string(),
            children: BTreeSet::new(),
            errors: Vec::new(),
        }
    }

    /// The page's URL, fragment-free.
    #[inline]
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    #[inline]
    pub(crate) fn url_parsed(&self) -> &Url {
        &self.url
    }

    /// The normalized identity key.
    #[inline]
    pub fn key(&self) -> &PageKey {
        &self.key
    }

    /// URL of the page whose body this one was discovered on; `None` for the
    /// seed.
    #[inline]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// True when the page lives outside the crawl's base domain.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.external
    }

    /// True once the page has completed processing.
    #[inline]
    pub fn is_visited(&self) -> bool {
        self.visited
    }

    /// The site context this page was classified against.
    #[inline]
    pub fn site(&self) -> &SiteContext {
        &self.site
    }

    pub(crate) fn set_visited(&mut self) {
        self.visited = true;
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Page {}

impl Hash for Page {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self
            .status
            .map_or_else(|| "-".to_string(), |code| code.to_string());
        write!(
            f,
            "{} [status: {status}, content-type: {}, external: {}, parent: {}, children: {}]",
            self.url,
            self.content_type,
            self.external,
            self.parent.as_deref().unwrap_or("-"),
            self.children.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_site(policy: SchemePolicy) -> Arc<SiteContext> {
        Arc::new(SiteContext {
            base_domain: "example.com".to_string(),
            base_site: "http://example.com".to_string(),
            always_external: vec!["slideshare.net".to_string()],
            scheme_policy: policy,
        })
    }

    fn page(url: &str, site: &Arc<SiteContext>) -> Page {
        Page::from_url(Url::parse(url).unwrap(), None, site)
    }

    #[test]
    fn fragment_never_participates_in_identity() {
        let site = test_site(SchemePolicy::Collapse);
        let a = page("http://example.com/docs#intro", &site);
        let b = page("http://example.com/docs#usage", &site);
        assert_eq!(a, b);
        assert_eq!(a.url(), "http://example.com/docs");
    }

    #[test]
    fn query_distinguishes_pages() {
        let site = test_site(SchemePolicy::Collapse);
        let a = page("http://example.com/search?q=1", &site);
        let b = page("http://example.com/search?q=2", &site);
        assert_ne!(a, b);
    }

    #[test]
    fn scheme_variants_collapse_by_default() {
        let site = test_site(SchemePolicy::Collapse);
        let a = page("http://example.com/pricing", &site);
        let b = page("https://example.com/pricing", &site);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn scheme_variants_stay_distinct_when_configured() {
        let site = test_site(SchemePolicy::Distinct);
        let a = page("http://example.com/pricing", &site);
        let b = page("https://example.com/pricing", &site);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn default_ports_collapse_into_the_bare_host() {
        let site = test_site(SchemePolicy::Collapse);
        let a = page("http://example.com:80/x", &site);
        let b = page("http://example.com/x", &site);
        assert_eq!(a.key(), b.key());

        let c = page("http://example.com:8080/x", &site);
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn classification_happens_at_construction() {
        let site = test_site(SchemePolicy::Collapse);
        assert!(!page("http://docs.example.com/api", &site).is_external());
        assert!(page("http://elsewhere.net/", &site).is_external());
    }

    #[test]
    fn listed_domains_are_always_external() {
        let site = test_site(SchemePolicy::Collapse);
        assert!(page("http://www.slideshare.net/deck/1", &site).is_external());
    }

    #[test]
    fn site_context_derives_domain_from_the_seed() {
        let config = CrawlConfig::new("https://blog.example.co.uk/start");
        let seed = Url::parse("https://blog.example.co.uk/start").unwrap();
        let site = SiteContext::for_seed(&seed, &config).unwrap();
        assert_eq!(site.base_domain, "example.co.uk");
        assert_eq!(site.base_site, "https://blog.example.co.uk");
    }
}
