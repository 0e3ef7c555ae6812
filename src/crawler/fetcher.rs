//! HTTP fetcher
//!
//! All network I/O for the pipeline goes through here:
//! - client construction with an identifying user agent
//! - robots.txt allow check before the first attempt
//! - the shared politeness clock before *every* attempt, retries included
//! - bounded retry with exponential backoff plus jitter
//!
//! # Retry policy
//!
//! | Condition            | Action                                 |
//! |----------------------|----------------------------------------|
//! | HTTP 2xx             | Success                                |
//! | HTTP 429             | Retry, honoring a Retry-After seconds hint |
//! | HTTP 5xx             | Retry with backoff                     |
//! | Other HTTP 4xx       | Permanent, no retry                    |
//! | Timeout              | Retry with backoff                     |
//! | Connection error     | Retry with backoff                     |
//!
//! Exhausted retries surface a typed [`FetchError`] carrying the URL and
//! attempt count. A fetch failure is never fatal here; the navigator
//! decides what a lost page means for the run.

use crate::config::{PipelineConfig, UserAgentConfig};
use crate::crawler::throttle::Throttle;
use crate::model::SourcePage;
use crate::robots::RobotsCache;
use crate::FetchError;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Longest single backoff sleep, whatever the attempt number says.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Builds the HTTP client used for a whole run.
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    request_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(request_timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rate-limited, retried page fetcher shared by all workers.
pub struct Fetcher {
    client: Client,
    throttle: Throttle,
    robots: RobotsCache,
    max_attempts: u32,
    backoff_base: Duration,
}

/// What went wrong on one attempt, before the retry decision.
enum AttemptFailure {
    Timeout,
    Status(u16),
    Connection(String),
}

impl Fetcher {
    pub fn new(
        client: Client,
        throttle: Throttle,
        robots: RobotsCache,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            client,
            throttle,
            robots,
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Fetches one page, returning it with its body and fetch timestamp.
    pub async fn fetch(&self, url: &str) -> Result<SourcePage, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::Connection {
            url: url.to_string(),
            attempts: 0,
            message: format!("invalid URL: {}", e),
        })?;

        if !self.robots.is_allowed(&self.client, &parsed).await {
            return Err(FetchError::RobotsDenied {
                url: url.to_string(),
            });
        }

        // Hold a worker slot for the whole fetch, retries included, so the
        // pool bound counts in-flight URLs rather than in-flight attempts.
        let _slot = self.throttle.slot().await;

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.throttle.wait_turn().await;

            let (failure, retry_hint) = match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let final_url = response.url().to_string();
                        match response.text().await {
                            Ok(body) => {
                                tracing::debug!("Fetched {} (attempt {})", url, attempt);
                                return Ok(SourcePage {
                                    url: url.to_string(),
                                    final_url,
                                    status: status.as_u16(),
                                    body,
                                    fetched_at: Utc::now(),
                                });
                            }
                            // Body read failures behave like a dropped connection
                            Err(e) => (AttemptFailure::Connection(e.to_string()), None),
                        }
                    } else if status == StatusCode::TOO_MANY_REQUESTS {
                        (
                            AttemptFailure::Status(status.as_u16()),
                            retry_after_hint(&response),
                        )
                    } else if status.is_server_error() {
                        (AttemptFailure::Status(status.as_u16()), None)
                    } else {
                        // Permanent client error
                        return Err(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                            attempts: attempt,
                        });
                    }
                }
                Err(e) if e.is_timeout() => (AttemptFailure::Timeout, None),
                Err(e) => (AttemptFailure::Connection(e.to_string()), None),
            };

            if attempt >= self.max_attempts {
                return Err(match failure {
                    AttemptFailure::Timeout => FetchError::Timeout {
                        url: url.to_string(),
                        attempts: attempt,
                    },
                    AttemptFailure::Status(status) => FetchError::Status {
                        url: url.to_string(),
                        status,
                        attempts: attempt,
                    },
                    AttemptFailure::Connection(message) => FetchError::Connection {
                        url: url.to_string(),
                        attempts: attempt,
                        message,
                    },
                });
            }

            let delay = retry_hint.unwrap_or_else(|| backoff_delay(self.backoff_base, attempt));
            tracing::debug!(
                "Transient failure on {} (attempt {}), retrying in {:?}",
                url,
                attempt,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Server-supplied Retry-After seconds, when present and plain.
fn retry_after_hint(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_BACKOFF))
}

/// Exponential backoff with jitter: `base * 2^(attempt-1)` plus up to half
/// a base interval of noise, capped.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exp = base.saturating_mul(1u32 << (attempt - 1).min(16));
    let jitter_ms = if base.as_millis() >= 2 {
        fastrand::u64(0..=(base.as_millis() as u64 / 2))
    } else {
        0
    };
    (exp + Duration::from_millis(jitter_ms)).min(MAX_BACKOFF)
}
