//! The core Crawler implementation.
//!
//! This module defines the `Crawler` struct, which acts as the central
//! orchestrator for a crawl run. It ties together the frontier, the request
//! pipeline, the processing lanes and the statistics collector, seeds the
//! frontier, and waits for the crawl to drain. Configuration problems are the
//! only failures it surfaces; everything that goes wrong on individual pages
//! is absorbed into those pages' state.
//!
//! After the lanes wind down, an optional browser probe pass annotates the
//! visited internal HTML pages with the errors a real browser sees on them.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::config::CrawlConfig;
use crate::crawler::lane::{DrainState, run_lane};
use crate::crawler::pipeline::RequestPipeline;
use crate::error::CrawlError;
use crate::extract::{HtmlAnchorExtractor, LinkExtractor};
use crate::frontier::Frontier;
use crate::page::{Page, SiteContext};
use crate::probe::JsProbe;
use crate::report;
use crate::stats::CrawlStats;

const USER_AGENT: &str = concat!("sitewalker/", env!("CARGO_PKG_VERSION"));

/// The central orchestrator for a crawl run.
pub struct Crawler {
    config: CrawlConfig,
    seed: Url,
    extractor: Arc<dyn LinkExtractor>,
    probe: Option<Arc<dyn JsProbe>>,
}

/// Everything a finished crawl produced.
pub struct CrawlSummary {
    /// Every visited page, in no particular order.
    pub pages: Vec<Page>,
    /// The run's statistics collector.
    pub stats: Arc<CrawlStats>,
    /// The site identity the crawl ran against.
    pub site: Arc<SiteContext>,
}

impl Crawler {
    /// Validates the configuration and builds a crawler.
    pub fn new(config: CrawlConfig) -> Result<Self, CrawlError> {
        let seed = config.validate()?;
        Ok(Self {
            config,
            seed,
            extractor: Arc::new(HtmlAnchorExtractor),
            probe: None,
        })
    }

    /// Replaces the default link extractor.
    pub fn with_extractor(mut self, extractor: impl LinkExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Attaches a browser probe for the post-crawl error pass.
    pub fn with_probe(mut self, probe: impl JsProbe + 'static) -> Self {
        self.probe = Some(Arc::new(probe));
        self
    }

    /// Runs the crawl to completion and returns the visited pages.
    pub async fn crawl(self) -> Result<CrawlSummary, CrawlError> {
        let site = Arc::new(SiteContext::for_seed(&self.seed, &self.config)?);
        info!(
            "Starting crawl of {} (lanes: {}, drain threshold: {}, base domain: {})",
            site.base_site, self.config.lanes, self.config.drain_threshold, site.base_domain
        );

        // Bad certificates are crawled and reported, not refused.
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.config.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .danger_accept_invalid_certs(true)
            .build()?;

        let stats = Arc::new(CrawlStats::new());
        let frontier = Arc::new(Frontier::new());
        let drain = Arc::new(DrainState::new(self.config.drain_threshold));
        let pipeline = Arc::new(RequestPipeline::new(
            client,
            Arc::clone(&self.extractor),
            Arc::clone(&site),
            Arc::clone(&stats),
        ));

        let seed_page = Page::from_url(self.seed.clone(), None, &site);
        if frontier.admit_if_new(seed_page) {
            stats.increment_pages_admitted();
        }

        trace!("Spawning {} lanes", self.config.lanes);
        let lanes: Vec<_> = (0..self.config.lanes)
            .map(|lane_id| {
                tokio::spawn(run_lane(
                    lane_id,
                    Arc::clone(&frontier),
                    Arc::clone(&pipeline),
                    Arc::clone(&drain),
                    Arc::clone(&stats),
                    self.config.poll_interval,
                ))
            })
            .collect();

        let progress_task = spawn_progress_task(Arc::clone(&frontier));

        for result in join_all(lanes).await {
            if let Err(e) = result {
                error!("A lane task failed: {:?}", e);
            }
        }
        progress_task.abort();

        if !frontier.is_idle() {
            warn!(
                "Frontier not idle after all lanes exited: {}",
                frontier.sizes()
            );
        }

        let mut pages = frontier.drain_visited();

        if let Some(probe) = &self.probe {
            info!("Running browser probe over {} visited pages", pages.len());
            probe_pages(probe.as_ref(), &mut pages, &self.config.error_codes).await;
        }

        info!(
            "Crawl finished. Stats: pages_admitted={}, pages_visited={}, head_requests={}, get_requests={}",
            stats.pages_admitted.load(Ordering::SeqCst),
            stats.pages_visited.load(Ordering::SeqCst),
            stats.head_requests.load(Ordering::SeqCst),
            stats.get_requests.load(Ordering::SeqCst)
        );

        Ok(CrawlSummary { pages, stats, site })
    }
}

fn spawn_progress_task(frontier: Arc<Frontier>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval_timer = tokio::time::interval(Duration::from_secs(2));
        interval_timer.tick().await;
        loop {
            interval_timer.tick().await;
            info!("Crawl progress: {}", frontier.sizes());
        }
    })
}

/// Annotates clean internal HTML pages with the errors a browser observes.
async fn probe_pages(probe: &dyn JsProbe, pages: &mut [Page], error_codes: &[u16]) {
    for page in pages.iter_mut() {
        if page.is_external() || !report::is_live_html(page, error_codes) {
            continue;
        }
        trace!("Probing {}", page.url());
        page.errors = probe.collect_errors(page.url()).await;
        if !page.errors.is_empty() {
            debug!("Probe found {} errors on {}", page.errors.len(), page.url());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::CONTENT_TYPE_UNKNOWN;

    #[test]
    fn invalid_configuration_fails_construction() {
        assert!(Crawler::new(CrawlConfig::new("::::")).is_err());
        assert!(Crawler::new(CrawlConfig::new("http://example.com").with_lanes(0)).is_err());
    }

    #[tokio::test]
    async fn crawl_of_an_unreachable_seed_still_terminates() {
        let config = CrawlConfig::new("http://seed.invalid/")
            .with_lanes(2)
            .with_drain_threshold(3)
            .with_poll_interval(Duration::from_millis(10))
            .with_request_timeout(Duration::from_secs(1));
        let summary = Crawler::new(config).unwrap().crawl().await.unwrap();

        assert_eq!(summary.pages.len(), 1);
        let seed = &summary.pages[0];
        assert!(seed.is_visited());
        assert_eq!(seed.content_type, CONTENT_TYPE_UNKNOWN);
        assert!(seed.children.is_empty());
    }
}
