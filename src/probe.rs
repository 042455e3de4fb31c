//! Browser-based page probing as an injected capability.
//!
//! A [`JsProbe`] loads a page in a real browser and reports the errors it
//! observes there (console errors, failed subresources). Probing happens
//! after the crawl as a reporting pass over visited internal HTML pages; it
//! never influences admission or fetching. No implementation ships in this
//! crate: embedders bring their own browser backend.

use async_trait::async_trait;

/// Loads pages in a browser and reports the errors observed.
#[async_trait]
pub trait JsProbe: Send + Sync {
    /// Returns the errors observed while loading `url`; empty when clean.
    async fn collect_errors(&self, url: &str) -> Vec<String>;
}
