//! Error types surfaced by the crawler's fallible setup and reporting paths.
//!
//! Per-page request failures are deliberately *not* errors: the pipeline
//! absorbs them into page state so a crawl always runs to completion. Only
//! startup problems (bad seed, bad configuration, client construction) and
//! report output problems bubble up as [`CrawlError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    /// The seed URL could not be parsed at all.
    #[error("invalid seed URL `{url}`")]
    InvalidSeed {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Configuration rejected before the crawl starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client(#[from] reqwest::Error),

    /// Writing report files failed.
    #[error("report output error")]
    Io(#[from] std::io::Error),

    /// Serializing stats or reports to JSON failed.
    #[error("serialization error")]
    Serialize(#[from] serde_json::Error),
}
