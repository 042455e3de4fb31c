//! Contains the per-page request pipeline.
//!
//! Every page taken from the frontier runs through the same state machine:
//!
//! - A HEAD request classifies the page. Its status code and content type are
//!   recorded; a transport failure or a status of 404 and above ends the page
//!   right there with an unknown content type.
//! - A GET fetches the body only when the HEAD succeeded, the content type
//!   says HTML and the page is internal to the crawled site. External pages
//!   and non-HTML resources are never downloaded.
//! - Anchors on a fetched body are resolved against the page URL and turned
//!   into candidate child pages; hrefs that cannot become pages are dropped.
//!
//! Nothing in here propagates an error upward. Request failures of every
//! kind collapse into page state, so a lane always gets its page back
//! completed.

use std::sync::Arc;

use tracing::{debug, trace, warn};
use url::Url;

use crate::extract::LinkExtractor;
use crate::page::{CONTENT_TYPE_UNKNOWN, Page, SiteContext};
use crate::stats::CrawlStats;

/// Resolution of one HEAD request.
enum HeadOutcome {
    Ok { status: u16, content_type: String },
    Failed { status: Option<u16>, reason: String },
}

/// Terminal state of one page's trip through the pipeline.
#[derive(Debug)]
pub(crate) enum FetchOutcome {
    /// HEAD failed or answered 404 or worse; the page is done.
    HeadFailed,
    /// HEAD succeeded but the body was not worth fetching.
    SkippedBody,
    /// Body fetched and parsed; candidate children discovered.
    Fetched { children: Vec<Page> },
    /// GET failed after a successful HEAD.
    BodyFailed,
}

/// Runs pages through HEAD and conditional GET, absorbing all failures.
pub(crate) struct RequestPipeline {
    client: reqwest::Client,
    extractor: Arc<dyn LinkExtractor>,
    site: Arc<SiteContext>,
    stats: Arc<CrawlStats>,
}

impl RequestPipeline {
    pub(crate) fn new(
        client: reqwest::Client,
        extractor: Arc<dyn LinkExtractor>,
        site: Arc<SiteContext>,
        stats: Arc<CrawlStats>,
    ) -> Self {
        Self {
            client,
            extractor,
            site,
            stats,
        }
    }

    /// Processes one page to completion and returns how it ended.
    ///
    /// The page's status, content type and children are filled in here;
    /// admitting the returned children is the caller's job.
    pub(crate) async fn process(&self, page: &mut Page) -> FetchOutcome {
        match self.head(page.url()).await {
            HeadOutcome::Failed { status, reason } => {
                page.status = status;
                page.content_type = CONTENT_TYPE_UNKNOWN.to_string();
                self.stats.increment_head_failures();
                debug!("HEAD failed for {}: {}", page.url(), reason);
                FetchOutcome::HeadFailed
            }
            HeadOutcome::Ok {
                status,
                content_type,
            } => {
                page.status = Some(status);
                page.content_type = content_type;

                if page.is_external() || !page.content_type.contains("text/html") {
                    trace!(
                        "Skipping body of {} (external: {}, content-type: {})",
                        page.url(),
                        page.is_external(),
                        page.content_type
                    );
                    self.stats.increment_bodies_skipped();
                    return FetchOutcome::SkippedBody;
                }

                match self.get(page.url()).await {
                    Ok(body) => {
                        let children = self.collect_links(page, &body);
                        FetchOutcome::Fetched { children }
                    }
                    Err(error) => {
                        page.content_type = CONTENT_TYPE_UNKNOWN.to_string();
                        self.stats.increment_get_failures();
                        debug!("GET failed for {}: {}", page.url(), error);
                        FetchOutcome::BodyFailed
                    }
                }
            }
        }
    }

    /// Issues the classifying HEAD request.
    ///
    /// Any status of 404 and above counts as failure; everything below,
    /// including 403, is a usable answer.
    async fn head(&self, url: &str) -> HeadOutcome {
        self.stats.increment_head_requests();
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                self.stats.record_response_status(status);
                if status >= 404 {
                    HeadOutcome::Failed {
                        status: Some(status),
                        reason: format!("status {status}"),
                    }
                } else {
                    // Multiple Content-Type headers concatenate; a missing one
                    // yields the empty string, which later skips the GET.
                    let content_type = response
                        .headers()
                        .get_all(reqwest::header::CONTENT_TYPE)
                        .iter()
                        .filter_map(|value| value.to_str().ok())
                        .collect::<Vec<_>>()
                        .join("");
                    HeadOutcome::Ok {
                        status,
                        content_type,
                    }
                }
            }
            Err(error) => HeadOutcome::Failed {
                status: None,
                reason: error.to_string(),
            },
        }
    }

    /// Fetches the page body, treating HTTP error statuses as failures.
    async fn get(&self, url: &str) -> Result<String, reqwest::Error> {
        self.stats.increment_get_requests();
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        self.stats.add_bytes_downloaded(body.len());
        Ok(body)
    }

    /// Extracts anchors from `body`, records them on the page and returns the
    /// candidate child pages.
    fn collect_links(&self, page: &mut Page, body: &str) -> Vec<Page> {
        let anchors = self.extractor.extract_anchors(body);
        self.stats.add_links_extracted(anchors.len());
        trace!("Extracted {} anchors from {}", anchors.len(), page.url());

        let mut children = Vec::new();
        for href in anchors {
            match resolve_href(page, &href) {
                Some(resolved) => {
                    let child = Page::from_url(resolved, Some(page.url()), &self.site);
                    page.children.insert(child.url().to_string());
                    children.push(child);
                }
                None => {
                    self.stats.increment_links_discarded();
                    trace!("Discarded href on {}: {}", page.url(), href);
                }
            }
        }
        children
    }
}

/// Resolves one raw href against its page.
///
/// A bare fragment points at the page itself. Script pseudo-links and mail
/// links produce nothing, as does any href the URL parser rejects.
pub(crate) fn resolve_href(page: &Page, href: &str) -> Option<Url> {
    if href.starts_with('#') {
        return Some(page.url_parsed().clone());
    }
    if href.contains("javascript:void") || href.starts_with("mailto") {
        return None;
    }
    match page.url_parsed().join(href) {
        Ok(resolved) => Some(resolved),
        Err(error) => {
            warn!("Unresolvable href on {}: {} ({})", page.url(), href, error);
            None
        }
    }
}
