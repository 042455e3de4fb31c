//! Sitewalker main entry point
//!
//! This is the command-line interface for the sitewalker crawl engine.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use sitewalker::{CrawlConfig, CrawlReport, Crawler, SchemePolicy};
use tracing_subscriber::EnvFilter;

/// Sitewalker: a single-site crawler and link auditor
///
/// Sitewalker maps every page reachable from a seed URL, checks off-site
/// links without downloading their bodies, and reports broken pages grouped
/// under the page that linked to them.
#[derive(Parser, Debug)]
#[command(name = "sitewalker")]
#[command(version)]
#[command(about = "Crawl a site and audit every reachable page", long_about = None)]
struct Cli {
    /// Seed URL the crawl starts from
    #[arg(value_name = "URL")]
    url: String,

    /// Number of concurrent crawl lanes (defaults to the CPU count)
    #[arg(short, long)]
    lanes: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Consecutive idle polls before the crawl is considered drained
    #[arg(long, default_value_t = 25)]
    drain_threshold: u32,

    /// Delay between polls of an empty frontier, in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_interval_ms: u64,

    /// Domain to treat as external even when it matches the base domain (repeatable)
    #[arg(long = "external-domain", value_name = "DOMAIN")]
    external_domains: Vec<String>,

    /// Status code reported as a broken page (repeatable)
    #[arg(long = "error-code", value_name = "CODE", default_values_t = vec![404u16, 500, 502, 503])]
    error_codes: Vec<u16>,

    /// Keep http and https variants of a URL as distinct pages
    #[arg(long)]
    keep_scheme: bool,

    /// Directory the page-list files are written into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(0) => {}
        Ok(error_pages) => {
            tracing::warn!("Crawl found {} broken pages", error_pages);
            process::exit(1);
        }
        Err(e) => {
            tracing::error!("Crawl failed: {e:#}");
            process::exit(2);
        }
    }
}

/// Runs the crawl and returns the number of broken pages it found.
async fn run(cli: Cli) -> Result<usize> {
    let error_codes = cli.error_codes.clone();

    let mut config = CrawlConfig::new(&cli.url)
        .with_drain_threshold(cli.drain_threshold)
        .with_poll_interval(Duration::from_millis(cli.poll_interval_ms))
        .with_request_timeout(Duration::from_secs(cli.timeout_secs))
        .with_always_external(cli.external_domains)
        .with_error_codes(cli.error_codes);
    if let Some(lanes) = cli.lanes {
        config = config.with_lanes(lanes);
    }
    if cli.keep_scheme {
        config = config.with_scheme_policy(SchemePolicy::Distinct);
    }

    let summary = Crawler::new(config)?.crawl().await?;

    let report = CrawlReport::from_pages(&summary.pages, &error_codes);
    report.write_page_lists(&cli.output_dir)?;

    if cli.json {
        println!("{}", report.to_json_string_pretty()?);
    } else {
        println!("{report}");
        println!("{}", summary.stats);
    }

    Ok(report.error_count())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitewalker=info,warn"),
            1 => EnvFilter::new("sitewalker=debug,info"),
            2 => EnvFilter::new("sitewalker=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
