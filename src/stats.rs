//! # Statistics Module
//!
//! Collects and stores metrics about a crawl run.
//!
//! ## Overview
//!
//! The `CrawlStats` collector tracks what the crawl did: pages admitted,
//! deduplicated and visited, HEAD and GET requests issued and failed, link
//! extraction volume and response status distribution. The counters are
//! updated from every lane concurrently and read live for progress logging.
//!
//! ## Key Metrics Tracked
//!
//! - **Page Metrics**: Admitted, duplicate-dropped, and visited pages
//! - **Request Metrics**: HEAD and GET counts with their failure tallies
//! - **Link Metrics**: Extracted and discarded hrefs
//! - **Response Metrics**: Status code distribution and bytes downloaded
//!
//! ## Features
//!
//! - **Thread-Safe**: Uses atomic operations for concurrent updates
//! - **Export Formats**: Supports JSON and Markdown export formats
//! - **Snapshot Capability**: Captures consistent state for reporting
//!
//! ## Example
//!
//! ```rust,ignore
//! use sitewalker::CrawlStats;
//!
//! let stats = CrawlStats::new();
//! // ... lanes update counters while crawling ...
//! println!("{stats}");
//! println!("{}", stats.to_markdown_string());
//! ```

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use crate::error::CrawlError;

// A snapshot of the current statistics, used for reporting.
// This keeps the export/display methods from re-reading live counters.
struct StatsSnapshot {
    pages_admitted: usize,
    pages_visited: usize,
    duplicates_dropped: usize,
    head_requests: usize,
    head_failures: usize,
    get_requests: usize,
    get_failures: usize,
    bodies_skipped: usize,
    links_extracted: usize,
    links_discarded: usize,
    total_bytes_downloaded: usize,
    response_status_counts: HashMap<u16, usize>,
    elapsed_duration: Duration,
}

impl StatsSnapshot {
    fn formatted_duration(&self) -> String {
        format!("{:?}", self.elapsed_duration)
    }

    fn pages_per_second(&self) -> f64 {
        let total_seconds = self.elapsed_duration.as_secs();
        if total_seconds > 0 {
            self.pages_visited as f64 / total_seconds as f64
        } else {
            0.0
        }
    }

    fn requests_per_second(&self) -> f64 {
        let total_seconds = self.elapsed_duration.as_secs();
        if total_seconds > 0 {
            (self.head_requests + self.get_requests) as f64 / total_seconds as f64
        } else {
            0.0
        }
    }

    fn formatted_bytes(&self) -> String {
        const KB: usize = 1024;
        const MB: usize = 1024 * KB;
        const GB: usize = 1024 * MB;

        if self.total_bytes_downloaded >= GB {
            format!("{:.2} GB", self.total_bytes_downloaded as f64 / GB as f64)
        } else if self.total_bytes_downloaded >= MB {
            format!("{:.2} MB", self.total_bytes_downloaded as f64 / MB as f64)
        } else if self.total_bytes_downloaded >= KB {
            format!("{:.2} KB", self.total_bytes_downloaded as f64 / KB as f64)
        } else {
            format!("{} B", self.total_bytes_downloaded)
        }
    }
}

/// Collects and stores statistics about a crawl run.
#[derive(Debug, serde::Serialize)]
pub struct CrawlStats {
    #[serde(skip)]
    pub start_time: Instant,

    // Page-related metrics
    pub pages_admitted: AtomicUsize,
    pub pages_visited: AtomicUsize,
    pub duplicates_dropped: AtomicUsize,

    // Request-related metrics
    pub head_requests: AtomicUsize,
    pub head_failures: AtomicUsize,
    pub get_requests: AtomicUsize,
    pub get_failures: AtomicUsize,
    pub bodies_skipped: AtomicUsize,

    // Link-related metrics
    pub links_extracted: AtomicUsize,
    pub links_discarded: AtomicUsize,

    // Response-related metrics
    pub response_status_counts: Arc<dashmap::DashMap<u16, usize>>,
    pub total_bytes_downloaded: AtomicUsize,
}

impl CrawlStats {
    /// Creates a new `CrawlStats` with all counters initialized to zero.
    pub(crate) fn new() -> Self {
        CrawlStats {
            start_time: Instant::now(),
            pages_admitted: AtomicUsize::new(0),
            pages_visited: AtomicUsize::new(0),
            duplicates_dropped: AtomicUsize::new(0),
            head_requests: AtomicUsize::new(0),
            head_failures: AtomicUsize::new(0),
            get_requests: AtomicUsize::new(0),
            get_failures: AtomicUsize::new(0),
            bodies_skipped: AtomicUsize::new(0),
            links_extracted: AtomicUsize::new(0),
            links_discarded: AtomicUsize::new(0),
            response_status_counts: Arc::new(dashmap::DashMap::new()),
            total_bytes_downloaded: AtomicUsize::new(0),
        }
    }

    /// Creates a snapshot of the current statistics.
    /// This is the single source of truth for all presentation logic.
    fn snapshot(&self) -> StatsSnapshot {
        let mut status_counts: HashMap<u16, usize> = HashMap::new();
        for entry in self.response_status_counts.iter() {
            let (key, value) = entry.pair();
            status_counts.insert(*key, *value);
        }

        StatsSnapshot {
            pages_admitted: self.pages_admitted.load(Ordering::SeqCst),
            pages_visited: self.pages_visited.load(Ordering::SeqCst),
            duplicates_dropped: self.duplicates_dropped.load(Ordering::SeqCst),
            head_requests: self.head_requests.load(Ordering::SeqCst),
            head_failures: self.head_failures.load(Ordering::SeqCst),
            get_requests: self.get_requests.load(Ordering::SeqCst),
            get_failures: self.get_failures.load(Ordering::SeqCst),
            bodies_skipped: self.bodies_skipped.load(Ordering::SeqCst),
            links_extracted: self.links_extracted.load(Ordering::SeqCst),
            links_discarded: self.links_discarded.load(Ordering::SeqCst),
            total_bytes_downloaded: self.total_bytes_downloaded.load(Ordering::SeqCst),
            response_status_counts: status_counts,
            elapsed_duration: self.start_time.elapsed(),
        }
    }

    /// Increments the count of admitted pages.
    pub(crate) fn increment_pages_admitted(&self) {
        self.pages_admitted.fetch_add(1, Ordering::SeqCst);
    }

    /// Increments the count of visited pages.
    pub(crate) fn increment_pages_visited(&self) {
        self.pages_visited.fetch_add(1, Ordering::SeqCst);
    }

    /// Increments the count of pages dropped as duplicates.
    pub(crate) fn increment_duplicates_dropped(&self) {
        self.duplicates_dropped.fetch_add(1, Ordering::SeqCst);
    }

    /// Increments the count of HEAD requests issued.
    pub(crate) fn increment_head_requests(&self) {
        self.head_requests.fetch_add(1, Ordering::SeqCst);
    }

    /// Increments the count of failed HEAD requests.
    pub(crate) fn increment_head_failures(&self) {
        self.head_failures.fetch_add(1, Ordering::SeqCst);
    }

    /// Increments the count of GET requests issued.
    pub(crate) fn increment_get_requests(&self) {
        self.get_requests.fetch_add(1, Ordering::SeqCst);
    }

    /// Increments the count of failed GET requests.
    pub(crate) fn increment_get_failures(&self) {
        self.get_failures.fetch_add(1, Ordering::SeqCst);
    }

    /// Increments the count of pages whose body fetch was skipped.
    pub(crate) fn increment_bodies_skipped(&self) {
        self.bodies_skipped.fetch_add(1, Ordering::SeqCst);
    }

    /// Adds to the count of hrefs pulled out of fetched bodies.
    pub(crate) fn add_links_extracted(&self, count: usize) {
        self.links_extracted.fetch_add(count, Ordering::SeqCst);
    }

    /// Increments the count of hrefs discarded during link formatting.
    pub(crate) fn increment_links_discarded(&self) {
        self.links_discarded.fetch_add(1, Ordering::SeqCst);
    }

    /// Records a response status code.
    pub(crate) fn record_response_status(&self, status_code: u16) {
        *self.response_status_counts.entry(status_code).or_insert(0) += 1;
    }

    /// Adds to the total bytes downloaded.
    pub(crate) fn add_bytes_downloaded(&self, bytes: usize) {
        self.total_bytes_downloaded
            .fetch_add(bytes, Ordering::SeqCst);
    }

    /// Converts the statistics into a JSON string.
    pub fn to_json_string(&self) -> Result<String, CrawlError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Converts the statistics into a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String, CrawlError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Exports the current statistics to a Markdown formatted string.
    pub fn to_markdown_string(&self) -> String {
        let snapshot = self.snapshot();

        let status_codes_list: String = snapshot
            .response_status_counts
            .iter()
            .map(|(code, count)| format!("- **{}**: {}", code, count))
            .collect::<Vec<String>>()
            .join("\n");
        let status_codes_output = if status_codes_list.is_empty() {
            "N/A".to_string()
        } else {
            status_codes_list
        };

        format!(
            r#"# Crawl Statistics Report

- **Duration**: {}
- **Average Speed**: {:.2} page/s, {:.2} req/s

## Pages
| Metric     | Count |
|------------|-------|
| Admitted   | {}     |
| Visited    | {}     |
| Duplicates | {}     |

## Requests
| Metric       | Count |
|--------------|-------|
| HEAD sent    | {}     |
| HEAD failed  | {}     |
| GET sent     | {}     |
| GET failed   | {}     |
| Body skipped | {}     |
| Downloaded   | {}     |

## Links
| Metric     | Count |
|------------|-------|
| Extracted  | {}     |
| Discarded  | {}     |

## Status Codes
{}
"#,
            snapshot.formatted_duration(),
            snapshot.pages_per_second(),
            snapshot.requests_per_second(),
            snapshot.pages_admitted,
            snapshot.pages_visited,
            snapshot.duplicates_dropped,
            snapshot.head_requests,
            snapshot.head_failures,
            snapshot.get_requests,
            snapshot.get_failures,
            snapshot.bodies_skipped,
            snapshot.formatted_bytes(),
            snapshot.links_extracted,
            snapshot.links_discarded,
            status_codes_output
        )
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();

        writeln!(f, "\nCrawl Statistics")?;
        writeln!(f, "----------------")?;
        writeln!(f, "  duration : {}", snapshot.formatted_duration())?;
        writeln!(
            f,
            "  speed    : page/s: {:.2}, req/s: {:.2}",
            snapshot.pages_per_second(),
            snapshot.requests_per_second()
        )?;
        writeln!(
            f,
            "  pages    : admitted: {}, visited: {}, duplicates: {}",
            snapshot.pages_admitted, snapshot.pages_visited, snapshot.duplicates_dropped
        )?;
        writeln!(
            f,
            "  requests : head: {} ({} failed), get: {} ({} failed), skipped bodies: {}",
            snapshot.head_requests,
            snapshot.head_failures,
            snapshot.get_requests,
            snapshot.get_failures,
            snapshot.bodies_skipped
        )?;
        writeln!(
            f,
            "  links    : extracted: {}, discarded: {}, downloaded: {}",
            snapshot.links_extracted,
            snapshot.links_discarded,
            snapshot.formatted_bytes()
        )?;

        let status_string = if snapshot.response_status_counts.is_empty() {
            "none".to_string()
        } else {
            let mut counts: Vec<_> = snapshot.response_status_counts.iter().collect();
            counts.sort_by_key(|(code, _)| **code);
            counts
                .iter()
                .map(|(code, count)| format!("{}: {}", code, count))
                .collect::<Vec<String>>()
                .join(", ")
        };

        writeln!(f, "  status   : {}\n", status_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = CrawlStats::new();
        stats.increment_pages_admitted();
        stats.increment_pages_admitted();
        stats.increment_pages_visited();
        stats.record_response_status(200);
        stats.record_response_status(200);
        stats.record_response_status(404);
        stats.add_bytes_downloaded(2048);

        assert_eq!(stats.pages_admitted.load(Ordering::SeqCst), 2);
        assert_eq!(stats.pages_visited.load(Ordering::SeqCst), 1);
        assert_eq!(*stats.response_status_counts.get(&200).unwrap(), 2);
        assert_eq!(*stats.response_status_counts.get(&404).unwrap(), 1);
    }

    #[test]
    fn display_includes_every_metric_family() {
        let stats = CrawlStats::new();
        stats.increment_head_requests();
        stats.record_response_status(200);

        let rendered = format!("{stats}");
        assert!(rendered.contains("pages"));
        assert!(rendered.contains("requests"));
        assert!(rendered.contains("links"));
        assert!(rendered.contains("200: 1"));
    }

    #[test]
    fn json_export_round_trips_counter_values() {
        let stats = CrawlStats::new();
        stats.increment_get_requests();

        let json = stats.to_json_string().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["get_requests"], 1);
    }
}
