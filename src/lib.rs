//! Wastemap: a polite waste-services directory scraper
//!
//! This crate implements a scraping-and-transformation pipeline that turns a
//! public waste-management-services directory (per-region listing pages plus
//! per-location detail pages) into a clean, schema-stable dataset, while
//! respecting robots.txt and a global politeness interval.

pub mod config;
pub mod crawler;
pub mod dataset;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod output;
pub mod robots;
pub mod storage;

use thiserror::Error;

/// Main error type for Wastemap operations
#[derive(Debug, Error)]
pub enum WastemapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Coverage error: {0}")]
    Coverage(#[from] CoverageError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Run exceeded its {budget_secs}s timeout budget")]
    RunTimeout { budget_secs: u64 },

    #[error("No seed produced any page; nothing to scrape")]
    AllSeedsFailed,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// A single page fetch failure, after retries where they apply.
///
/// Transient failures (timeouts, connection resets, 5xx, 429) are retried up
/// to the configured attempt cap before one of these is surfaced; permanent
/// failures (other 4xx, robots.txt denial) are surfaced immediately. A
/// `FetchError` is always a per-page event: whether it is fatal for the run
/// is the navigator's call, not the fetcher's.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out ({attempts} attempts)")]
    Timeout { url: String, attempts: u32 },

    #[error("{url} returned HTTP {status} ({attempts} attempts)")]
    Status {
        url: String,
        status: u16,
        attempts: u32,
    },

    #[error("connection to {url} failed ({attempts} attempts): {message}")]
    Connection {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("{url} disallowed by robots.txt")]
    RobotsDenied { url: String },
}

/// A single-record extraction failure. The record is skipped and counted;
/// the rest of the page is still processed.
#[derive(Debug, Error)]
#[error("failed to extract record from {url}: {reason}")]
pub struct ParseError {
    pub url: String,
    pub reason: String,
}

/// A single-record normalization failure. The record is rejected and
/// counted; the run continues unless the rejection ratio trips.
#[derive(Debug, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

/// Run-level failure: too many pages or records were lost to produce a
/// trustworthy dataset. Nothing is written when this is raised.
#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("{failed} of {attempted} listing pages failed (limit {max_ratio})")]
    Pages {
        failed: u64,
        attempted: u64,
        max_ratio: f64,
    },

    #[error("{rejected} of {processed} records rejected (limit {max_ratio})")]
    Rejections {
        rejected: u64,
        processed: u64,
        max_ratio: f64,
    },
}

/// Run-level persistence failure. The previously published dataset pointer
/// is left untouched.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to encode manifest: {0}")]
    Manifest(#[from] toml::ser::Error),

    #[error("Failed to read previous dataset {path}: {reason}")]
    PreviousDataset { path: String, reason: String },

    #[error("Capture store error: {0}")]
    Capture(#[from] storage::StorageError),
}

/// Result type alias for Wastemap operations
pub type Result<T> = std::result::Result<T, WastemapError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run, RunOutcome, RunReport};
pub use dataset::Dataset;
pub use model::{RawRecord, ServiceLocation, SourcePage};
