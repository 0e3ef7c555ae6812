//! Robots.txt handling
//!
//! Fetches robots.txt once per host, caches the parsed result for the run,
//! and answers allow/deny checks. A Crawl-delay directive feeds into the
//! politeness interval (the larger of the two wins).

use reqwest::Client;
use robotstxt::DefaultMatcher;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// Parsed robots.txt data for one host.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty means allow all)
    content: String,
}

impl ParsedRobots {
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Permissive default, used when robots.txt is absent or unreachable.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Checks whether `url` may be fetched by `user_agent`.
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.is_empty() {
            return true;
        }
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Crawl-delay in seconds for `user_agent`, preferring an agent-specific
    /// group over the `*` group. The robotstxt crate does not expose this
    /// directive, so the groups are scanned directly.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.content.is_empty() {
            return None;
        }

        let normalized_agent = user_agent.to_lowercase();
        let mut current_agents: Vec<String> = Vec::new();
        let mut wildcard_delay: Option<f64> = None;
        let mut agent_delay: Option<f64> = None;

        for line in self.content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    current_agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    if let Ok(delay) = value.parse::<f64>() {
                        if current_agents.iter().any(|ua| ua == "*") {
                            wildcard_delay = Some(delay);
                        }
                        if current_agents
                            .iter()
                            .any(|ua| ua != "*" && normalized_agent.contains(ua.as_str()))
                        {
                            agent_delay = Some(delay);
                        }
                    }
                    current_agents.clear();
                }
                // Allow/Disallow lines do not affect delay parsing; the
                // group stays current until its crawl-delay (if any).
                _ => {}
            }
        }

        agent_delay.or(wildcard_delay)
    }
}

/// Per-host robots.txt cache shared by all workers for one run.
pub struct RobotsCache {
    entries: Mutex<HashMap<String, Arc<ParsedRobots>>>,
    user_agent: String,
}

impl RobotsCache {
    pub fn new(user_agent: String) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            user_agent,
        }
    }

    /// Returns the parsed robots.txt for the host of `url`, fetching it on
    /// first use. Fetch failures and non-200s degrade to allow-all: an
    /// unreachable robots.txt must not take the whole run down.
    pub async fn get(&self, client: &Client, url: &Url) -> Arc<ParsedRobots> {
        let host = match url.host_str() {
            Some(h) => host_key(url, h),
            None => return Arc::new(ParsedRobots::allow_all()),
        };

        {
            let entries = self.entries.lock().await;
            if let Some(robots) = entries.get(&host) {
                return Arc::clone(robots);
            }
        }

        let robots = Arc::new(fetch_robots(client, url).await);
        tracing::debug!("Fetched robots.txt for {}", host);

        let mut entries = self.entries.lock().await;
        entries.entry(host).or_insert_with(|| Arc::clone(&robots));
        robots
    }

    /// Allow/deny check for a URL, fetching the host's robots.txt if needed.
    pub async fn is_allowed(&self, client: &Client, url: &Url) -> bool {
        self.get(client, url)
            .await
            .is_allowed(url.as_str(), &self.user_agent)
    }

    /// Crawl-delay for the host of `url`, if its robots.txt sets one.
    pub async fn crawl_delay(&self, client: &Client, url: &Url) -> Option<f64> {
        self.get(client, url).await.crawl_delay(&self.user_agent)
    }
}

fn host_key(url: &Url, host: &str) -> String {
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

async fn fetch_robots(client: &Client, url: &Url) -> ParsedRobots {
    let mut robots_url = url.clone();
    robots_url.set_path("/robots.txt");
    robots_url.set_query(None);
    robots_url.set_fragment(None);

    match client.get(robots_url.as_str()).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(body) => ParsedRobots::from_content(&body),
            Err(e) => {
                tracing::warn!("Failed to read robots.txt body from {}: {}", robots_url, e);
                ParsedRobots::allow_all()
            }
        },
        Ok(response) => {
            tracing::debug!(
                "robots.txt at {} returned HTTP {}, allowing all",
                robots_url,
                response.status()
            );
            ParsedRobots::allow_all()
        }
        Err(e) => {
            tracing::warn!("Failed to fetch robots.txt from {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}
