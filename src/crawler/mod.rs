//! # Crawler Module
//!
//! Implements the crawling engine that walks a single site to completion.
//!
//! ## Overview
//!
//! The crawler module provides the main `Crawler` struct and the pieces it
//! coordinates: the processing lanes that drain the frontier, the per-page
//! request pipeline, and the idle-drain detector that decides when the crawl
//! is over. A run is seeded with one URL and ends when every reachable page
//! has been processed and the frontier has stayed quiet long enough.
//!
//! ## Key Components
//!
//! - **Crawler**: The central orchestrator that manages the crawl lifecycle
//! - **Lanes**: Cooperative workers that take pages, process them and admit
//!   the links they discover
//! - **Request Pipeline**: The HEAD-then-conditional-GET state machine every
//!   page runs through
//! - **Drain State**: Shared idle bookkeeping that terminates the run
//!
//! ## Architecture
//!
//! The crawler uses an asynchronous, task-based model where each lane runs as
//! a separate Tokio task. Lanes share the frontier and statistics collector
//! directly; there is no channel plumbing between them, because ownership of
//! a page moves with the lane that took it.

mod core;
mod lane;
mod pipeline;

pub use core::{CrawlSummary, Crawler};
