use serde::Deserialize;

/// Main configuration structure for Wastemap
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pipeline: PipelineConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(rename = "seed", default)]
    pub seeds: Vec<SeedEntry>,
}

/// Pipeline behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Minimum spacing between any two outbound requests (milliseconds).
    /// Enforced globally, across all workers.
    #[serde(rename = "politeness-interval-ms", default = "default_politeness")]
    pub politeness_interval_ms: u64,

    /// Per-request timeout (milliseconds).
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Maximum fetch attempts per URL, first try included.
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff between retries (milliseconds); doubles per attempt,
    /// plus jitter.
    #[serde(rename = "retry-backoff-ms", default = "default_backoff")]
    pub retry_backoff_ms: u64,

    /// Bounded worker pool size for page fetches.
    #[serde(rename = "fetch-concurrency", default = "default_concurrency")]
    pub fetch_concurrency: u32,

    /// Hard cap on pagination depth per seed.
    #[serde(rename = "max-pages-per-seed", default = "default_max_pages")]
    pub max_pages_per_seed: u32,

    /// Abort the run when more than this fraction of listing pages fail.
    #[serde(rename = "max-failed-page-ratio", default = "default_failed_ratio")]
    pub max_failed_page_ratio: f64,

    /// Abort the run when more than this fraction of records is rejected.
    #[serde(rename = "max-rejection-ratio", default = "default_rejection_ratio")]
    pub max_rejection_ratio: f64,

    /// Whole-run timeout budget in seconds; unset means unbounded.
    #[serde(rename = "run-timeout-secs", default)]
    pub run_timeout_secs: Option<u64>,

    /// Drop previously published locations that the crawl no longer sees.
    #[serde(rename = "purge-missing", default)]
    pub purge_missing: bool,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(rename = "scraper-name")]
    pub scraper_name: String,

    #[serde(rename = "scraper-version")]
    pub scraper_version: String,

    /// URL with information about the scraper
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for scraper-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: ScraperName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.scraper_name, self.scraper_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory for run artifacts and the current-dataset pointer.
    pub root: String,
}

/// A top-level entry point: one per-region listing URL.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    /// Region label (e.g. a state/territory abbreviation).
    pub region: String,

    /// First listing page for the region.
    pub url: String,
}

fn default_politeness() -> u64 {
    700
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> u64 {
    500
}

fn default_concurrency() -> u32 {
    3
}

fn default_max_pages() -> u32 {
    50
}

fn default_failed_ratio() -> f64 {
    0.5
}

fn default_rejection_ratio() -> f64 {
    0.25
}
