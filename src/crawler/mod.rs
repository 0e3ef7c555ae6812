//! Crawling and pipeline orchestration
//!
//! This module contains the run-time machinery:
//! - HTTP fetching with retry and backoff
//! - the global politeness throttle
//! - per-seed pagination walks
//! - the shared failure/rejection tally
//! - the coordinator that drives a run end to end

mod coordinator;
mod fetcher;
mod navigator;
mod tally;
mod throttle;

pub use coordinator::{run_pipeline, RunOutcome, RunReport};
pub use fetcher::{build_http_client, Fetcher};
pub use navigator::{seed_walks, SeedWalk};
pub use tally::{RunTally, SharedTally};
pub use throttle::{effective_interval, Throttle};

use crate::config::Config;

/// Runs a complete pipeline: enumerate pages, extract and validate
/// records, merge with the published dataset, and publish atomically.
///
/// Returns the run report on success or partial success; run-level
/// failures (coverage collapse, timeout, write failure) surface as errors
/// and leave the previously published dataset untouched.
pub async fn run(config: Config, config_hash: String) -> crate::Result<RunReport> {
    run_pipeline(config, config_hash).await
}
