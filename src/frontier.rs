//! # Frontier Module
//!
//! Implements the URL frontier: the partition of every discovered page into
//! pending, in-flight and visited sets.
//!
//! ## Overview
//!
//! The `Frontier` is the crawl's single source of truth for which URLs exist
//! and where each one stands. Every discovered URL lives in exactly one of
//! three sets: *pending* (admitted, waiting for a lane), *in flight* (owned
//! by a lane right now) and *visited* (processing finished, terminal). All
//! transitions happen under one lock, so a page can never be observed in two
//! sets at once or fall out of the partition.
//!
//! ## Key Responsibilities
//!
//! - **Admission**: `admit_if_new` performs the membership check across all
//!   three sets and the pending insert as one atomic step, so concurrent
//!   lanes discovering the same URL admit it exactly once.
//! - **Hand-off**: `take_one_pending` moves a page to in-flight and hands the
//!   caller exclusive ownership of it in the same step.
//! - **Completion**: `mark_visited` retires a page permanently.
//! - **Progress counters**: lock-free size reads for polling and logging.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sitewalker::frontier::Frontier;
//!
//! let frontier = Frontier::new();
//! frontier.admit_if_new(seed_page);
//! while let Some(page) = frontier.take_one_pending() {
//!     // ... process the page ...
//!     frontier.mark_visited(page);
//! }
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::page::{Page, PageKey};

#[derive(Default)]
struct FrontierInner {
    pending: VecDeque<Page>,
    pending_keys: HashSet<PageKey>,
    in_flight: HashSet<PageKey>,
    visited: HashMap<PageKey, Page>,
}

/// The three-set URL frontier shared by every lane of a crawl.
#[derive(Default)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    pending_count: AtomicUsize,
    in_flight_count: AtomicUsize,
    visited_count: AtomicUsize,
    admitted_total: AtomicUsize,
}

impl Frontier {
    /// Creates an empty frontier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a page unless its identity is already known to the crawl.
    ///
    /// Returns `true` when the page was admitted to the pending set.
    pub fn admit_if_new(&self, page: Page) -> bool {
        let mut inner = self.inner.lock();
        let key = page.key();
        if inner.pending_keys.contains(key)
            || inner.in_flight.contains(key)
            || inner.visited.contains_key(key)
        {
            trace!("Duplicate identity, page dropped: {}", page.url());
            return false;
        }
        trace!("Admitting page: {}", page.url());
        inner.pending_keys.insert(key.clone());
        inner.pending.push_back(page);
        self.pending_count.fetch_add(1, Ordering::SeqCst);
        self.admitted_total.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// Takes one pending page, moving it to in-flight in the same step.
    ///
    /// The returned page is exclusively owned by the caller until it comes
    /// back through [`Frontier::mark_visited`]. Returns `None` when nothing
    /// is pending.
    pub fn take_one_pending(&self) -> Option<Page> {
        let mut inner = self.inner.lock();
        let page = inner.pending.pop_front()?;
        inner.pending_keys.remove(page.key());
        inner.in_flight.insert(page.key().clone());
        self.pending_count.fetch_sub(1, Ordering::SeqCst);
        self.in_flight_count.fetch_add(1, Ordering::SeqCst);
        trace!("Page taken for processing: {}", page.url());
        Some(page)
    }

    /// Retires a processed page into the visited set.
    pub fn mark_visited(&self, mut page: Page) {
        page.set_visited();
        let mut inner = self.inner.lock();
        if inner.in_flight.remove(page.key()) {
            self.in_flight_count.fetch_sub(1, Ordering::SeqCst);
        } else {
            warn!("Page completed without being in flight: {}", page.url());
        }
        trace!("Page visited: {}", page.url());
        inner.visited.insert(page.key().clone(), page);
        self.visited_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Current sizes of the three sets plus the admission total.
    pub fn sizes(&self) -> FrontierSizes {
        FrontierSizes {
            pending: self.pending_count.load(Ordering::SeqCst),
            in_flight: self.in_flight_count.load(Ordering::SeqCst),
            visited: self.visited_count.load(Ordering::SeqCst),
            admitted: self.admitted_total.load(Ordering::SeqCst),
        }
    }

    /// Checks if nothing is waiting for a lane.
    #[inline]
    pub fn is_pending_empty(&self) -> bool {
        self.pending_count.load(Ordering::SeqCst) == 0
    }

    /// Checks if the crawl has nothing pending and nothing in flight.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.is_pending_empty() && self.in_flight_count.load(Ordering::SeqCst) == 0
    }

    /// Drains the visited set out of the frontier.
    pub fn drain_visited(&self) -> Vec<Page> {
        let mut inner = self.inner.lock();
        self.visited_count.store(0, Ordering::SeqCst);
        inner.visited.drain().map(|(_, page)| page).collect()
    }
}

/// Point-in-time view of the frontier's sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierSizes {
    pub pending: usize,
    pub in_flight: usize,
    pub visited: usize,
    pub admitted: usize,
}

impl fmt::Display for FrontierSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "admitted: {}, visited: {}, in flight: {}, pending: {}",
            self.admitted, self.visited, self.in_flight, self.pending
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{SchemePolicy, SiteContext};
    use std::sync::Arc;
    use url::Url;

    fn site() -> Arc<SiteContext> {
        Arc::new(SiteContext {
            base_domain: "example.com".to_string(),
            base_site: "http://example.com".to_string(),
            always_external: Vec::new(),
            scheme_policy: SchemePolicy::Collapse,
        })
    }

    fn page(url: &str, site: &Arc<SiteContext>) -> Page {
        Page::from_url(Url::parse(url).unwrap(), None, site)
    }

    #[test]
    fn admission_is_exactly_once_per_identity() {
        let frontier = Frontier::new();
        let site = site();
        assert!(frontier.admit_if_new(page("http://example.com/a", &site)));
        assert!(!frontier.admit_if_new(page("http://example.com/a", &site)));
        assert!(!frontier.admit_if_new(page("https://example.com/a", &site)));
        assert!(!frontier.admit_if_new(page("http://example.com/a#sec", &site)));
        assert_eq!(frontier.sizes().admitted, 1);
    }

    #[test]
    fn duplicates_are_rejected_in_every_set() {
        let frontier = Frontier::new();
        let site = site();
        frontier.admit_if_new(page("http://example.com/a", &site));

        let in_flight = frontier.take_one_pending().unwrap();
        assert!(!frontier.admit_if_new(page("http://example.com/a", &site)));

        frontier.mark_visited(in_flight);
        assert!(!frontier.admit_if_new(page("http://example.com/a", &site)));
        assert_eq!(frontier.sizes().visited, 1);
    }

    #[test]
    fn take_moves_the_page_to_in_flight() {
        let frontier = Frontier::new();
        let site = site();
        frontier.admit_if_new(page("http://example.com/a", &site));

        let taken = frontier.take_one_pending().unwrap();
        let sizes = frontier.sizes();
        assert_eq!((sizes.pending, sizes.in_flight, sizes.visited), (0, 1, 0));
        assert_eq!(taken.url(), "http://example.com/a");
        assert!(frontier.take_one_pending().is_none());
    }

    #[test]
    fn pages_come_out_in_admission_order() {
        let frontier = Frontier::new();
        let site = site();
        for path in ["/a", "/b", "/c"] {
            frontier.admit_if_new(page(&format!("http://example.com{path}"), &site));
        }
        assert_eq!(
            frontier.take_one_pending().unwrap().url(),
            "http://example.com/a"
        );
        assert_eq!(
            frontier.take_one_pending().unwrap().url(),
            "http://example.com/b"
        );
    }

    #[test]
    fn visited_pages_are_marked_and_drained() {
        let frontier = Frontier::new();
        let site = site();
        frontier.admit_if_new(page("http://example.com/a", &site));
        let taken = frontier.take_one_pending().unwrap();
        assert!(!taken.is_visited());
        frontier.mark_visited(taken);

        let pages = frontier.drain_visited();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_visited());
        assert!(frontier.is_idle());
    }

    #[test]
    fn concurrent_admission_admits_each_identity_once() {
        let frontier = Arc::new(Frontier::new());
        let site = site();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let frontier = Arc::clone(&frontier);
                let site = Arc::clone(&site);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let url = format!("http://example.com/page/{i}");
                        frontier.admit_if_new(Page::from_url(
                            Url::parse(&url).unwrap(),
                            None,
                            &site,
                        ));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(frontier.sizes().admitted, 50);
        assert_eq!(frontier.sizes().pending, 50);
    }
}
