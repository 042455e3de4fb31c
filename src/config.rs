//! Crawl configuration and its validation.
//!
//! [`CrawlConfig`] carries every knob a crawl run honors: concurrency width,
//! drain detection, request timeout, domain overrides and identity policy.
//! Construction is fluent; validation happens once when the crawler is built,
//! so a running crawl never hits a configuration failure.

use std::time::Duration;

use url::Url;

use crate::error::CrawlError;
use crate::page::SchemePolicy;

/// Configuration for a single crawl run.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// The URL the crawl starts from.
    pub seed: String,
    /// Overrides the base domain derived from the seed.
    pub base_domain: Option<String>,
    /// Registrable domains always treated as external.
    pub always_external: Vec<String>,
    /// Status codes grouped as errors in the report.
    pub error_codes: Vec<u16>,
    /// The number of concurrent processing lanes.
    pub lanes: usize,
    /// Consecutive idle polls before the crawl is considered drained.
    pub drain_threshold: u32,
    /// How long an idle lane waits between polls of the frontier.
    pub poll_interval: Duration,
    /// Timeout applied to every HEAD and GET request.
    pub request_timeout: Duration,
    /// Identity treatment of the `http`/`https` split.
    pub scheme_policy: SchemePolicy,
}

impl CrawlConfig {
    /// Creates a configuration with defaults for everything but the seed.
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            base_domain: None,
            always_external: Vec::new(),
            error_codes: vec![404, 500, 502, 503],
            lanes: num_cpus::get().clamp(2, 16),
            drain_threshold: 25,
            poll_interval: Duration::from_millis(100),
            request_timeout: Duration::from_secs(30),
            scheme_policy: SchemePolicy::default(),
        }
    }

    /// Sets the number of concurrent processing lanes.
    pub fn with_lanes(mut self, lanes: usize) -> Self {
        self.lanes = lanes;
        self
    }

    /// Overrides the base domain instead of deriving it from the seed.
    pub fn with_base_domain(mut self, domain: impl Into<String>) -> Self {
        self.base_domain = Some(domain.into());
        self
    }

    /// Sets the registrable domains that always classify as external.
    pub fn with_always_external<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.always_external = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the status codes grouped as errors in the report.
    pub fn with_error_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.error_codes = codes.into_iter().collect();
        self
    }

    /// Sets how many consecutive idle polls end the crawl.
    pub fn with_drain_threshold(mut self, threshold: u32) -> Self {
        self.drain_threshold = threshold;
        self
    }

    /// Sets the delay between polls of an empty frontier.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the timeout applied to every HEAD and GET request.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the identity treatment of the `http`/`https` split.
    pub fn with_scheme_policy(mut self, policy: SchemePolicy) -> Self {
        self.scheme_policy = policy;
        self
    }

    /// Validates the configuration and returns the parsed seed URL.
    pub(crate) fn validate(&self) -> Result<Url, CrawlError> {
        if self.lanes == 0 {
            return Err(CrawlError::Configuration(
                "lanes must be greater than 0.".to_string(),
            ));
        }
        if self.drain_threshold == 0 {
            return Err(CrawlError::Configuration(
                "drain threshold must be greater than 0.".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(CrawlError::Configuration(
                "poll interval must be non-zero.".to_string(),
            ));
        }
        let seed = Url::parse(&self.seed).map_err(|source| CrawlError::InvalidSeed {
            url: self.seed.clone(),
            source,
        })?;
        if seed.host_str().is_none() {
            return Err(CrawlError::Configuration(format!(
                "seed URL `{seed}` has no host."
            )));
        }
        Ok(seed)
    }
}
