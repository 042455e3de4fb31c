//! A "prelude" for users of the `sitewalker` crate.
//!
//! This prelude re-exports the most commonly used traits, structs, and macros
//! so that they can be easily imported.
//!
//! # Example
//!
//! ```
//! use sitewalker::prelude::*;
//! ```

pub use crate::{
    // Core structs
    CrawlConfig,
    CrawlReport,
    Crawler,
    Page,
    // Core traits
    JsProbe,
    LinkExtractor,
    // Essential re-export for trait implementation
    async_trait,
};

pub use crate::crawler::CrawlSummary;
pub use crate::error::CrawlError;
pub use crate::page::SchemePolicy;
