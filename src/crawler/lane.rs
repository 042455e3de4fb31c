//! The lane loop and the idle-drain detector that ends a crawl.
//!
//! A lane is one cooperative worker: it repeatedly takes a pending page,
//! runs it through the request pipeline, admits the children and retires the
//! page, then goes back for more. When nothing is pending it polls on a
//! fixed interval instead of exiting, because an in-flight page on another
//! lane may still produce work. The crawl ends only when the pending set has
//! stayed empty for a configured number of consecutive polls after at least
//! one page completed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{debug, trace};

use crate::crawler::pipeline::{FetchOutcome, RequestPipeline};
use crate::frontier::Frontier;
use crate::stats::CrawlStats;

/// Shared idle bookkeeping that decides when the crawl is over.
///
/// Idle polls only count once the first page has completed, so a slow seed
/// cannot end the crawl before it produced anything. Every taken page resets
/// the count, which keeps lanes alive through late bursts of discovered
/// links.
pub(crate) struct DrainState {
    started: AtomicBool,
    idle_polls: AtomicUsize,
    threshold: usize,
}

impl DrainState {
    pub(crate) fn new(threshold: u32) -> Self {
        Self {
            started: AtomicBool::new(false),
            idle_polls: AtomicUsize::new(0),
            threshold: threshold as usize,
        }
    }

    /// Resets the idle count; called whenever a lane obtains work.
    pub(crate) fn note_work(&self) {
        self.idle_polls.store(0, Ordering::SeqCst);
    }

    /// Marks that at least one page has completed.
    pub(crate) fn note_completion(&self) {
        self.started.store(true, Ordering::SeqCst);
    }

    /// Counts one empty poll and returns the running total.
    pub(crate) fn note_idle_poll(&self) -> usize {
        if !self.started.load(Ordering::SeqCst) {
            return 0;
        }
        self.idle_polls.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// True once enough consecutive idle polls have accumulated.
    pub(crate) fn is_drained(&self) -> bool {
        self.started.load(Ordering::SeqCst)
            && self.idle_polls.load(Ordering::SeqCst) >= self.threshold
    }

    #[inline]
    pub(crate) fn threshold(&self) -> usize {
        self.threshold
    }
}

/// Runs one lane until the crawl drains.
pub(crate) async fn run_lane(
    lane_id: usize,
    frontier: Arc<Frontier>,
    pipeline: Arc<RequestPipeline>,
    drain: Arc<DrainState>,
    stats: Arc<CrawlStats>,
    poll_interval: Duration,
) {
    trace!("Lane {} started", lane_id);
    loop {
        match frontier.take_one_pending() {
            Some(mut page) => {
                drain.note_work();
                debug!("Lane {} processing {}", lane_id, page.url());

                let outcome = pipeline.process(&mut page).await;
                if let FetchOutcome::Fetched { children } = outcome {
                    for child in children {
                        if frontier.admit_if_new(child) {
                            stats.increment_pages_admitted();
                        } else {
                            stats.increment_duplicates_dropped();
                        }
                    }
                }

                frontier.mark_visited(page);
                stats.increment_pages_visited();
                drain.note_completion();
            }
            None => {
                if drain.is_drained() {
                    trace!("Lane {} drained, exiting", lane_id);
                    break;
                }
                tokio::time::sleep(poll_interval).await;
                let polls = drain.note_idle_poll();
                trace!(
                    "Lane {} idle poll {} of {}",
                    lane_id,
                    polls,
                    drain.threshold()
                );
            }
        }
    }
    debug!("Lane {} finished", lane_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_polls_do_not_count_before_the_first_completion() {
        let drain = DrainState::new(3);
        for _ in 0..10 {
            drain.note_idle_poll();
        }
        assert!(!drain.is_drained());
    }

    #[test]
    fn drains_after_enough_idle_polls_once_started() {
        let drain = DrainState::new(3);
        drain.note_completion();
        assert!(!drain.is_drained());
        drain.note_idle_poll();
        drain.note_idle_poll();
        assert!(!drain.is_drained());
        drain.note_idle_poll();
        assert!(drain.is_drained());
    }

    #[test]
    fn taking_work_resets_the_idle_count() {
        let drain = DrainState::new(2);
        drain.note_completion();
        drain.note_idle_poll();
        drain.note_idle_poll();
        assert!(drain.is_drained());
        drain.note_work();
        assert!(!drain.is_drained());
    }
}
