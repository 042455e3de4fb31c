//! # sitewalker
//!
//! Single-site crawl engine that maps a site's link graph and audits every
//! reachable page.
//!
//! Starting from one seed URL, the crawler discovers links across a fixed
//! number of concurrent lanes and keeps every page it has ever seen: live
//! pages, broken links grouped under the page that linked to them, and
//! off-site references that got a reachability check but never a body fetch.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sitewalker::{CrawlConfig, CrawlReport, Crawler};
//!
//! async fn audit() -> Result<(), sitewalker::CrawlError> {
//!     let config = CrawlConfig::new("https://example.com").with_lanes(8);
//!     let summary = Crawler::new(config)?.crawl().await?;
//!
//!     let report = CrawlReport::from_pages(&summary.pages, &[404, 500, 502, 503]);
//!     println!("{report}");
//!     report.write_page_lists(std::path::Path::new("."))?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod domain;
pub mod error;
pub mod extract;
pub mod frontier;
pub mod page;
pub mod prelude;
pub mod probe;
pub mod report;
pub mod stats;

pub use config::CrawlConfig;
pub use crawler::{CrawlSummary, Crawler};
pub use error::CrawlError;
pub use extract::{HtmlAnchorExtractor, LinkExtractor};
pub use frontier::{Frontier, FrontierSizes};
pub use page::{Page, PageKey, SchemePolicy, SiteContext};
pub use probe::JsProbe;
pub use report::CrawlReport;
pub use stats::CrawlStats;

pub use async_trait::async_trait;
pub use tokio;
