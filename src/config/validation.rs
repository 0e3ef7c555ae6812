use crate::config::types::{Config, PipelineConfig, SeedEntry, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_pipeline_config(&config.pipeline)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates pipeline configuration
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.politeness_interval_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "politeness-interval-ms must be >= 100ms, got {}ms",
            config.politeness_interval_ms
        )));
    }

    if config.fetch_concurrency < 1 || config.fetch_concurrency > 8 {
        return Err(ConfigError::Validation(format!(
            "fetch-concurrency must be between 1 and 8, got {}",
            config.fetch_concurrency
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.max_pages_per_seed < 1 {
        return Err(ConfigError::Validation(
            "max-pages-per-seed must be >= 1".to_string(),
        ));
    }

    validate_ratio("max-failed-page-ratio", config.max_failed_page_ratio)?;
    validate_ratio("max-rejection-ratio", config.max_rejection_ratio)?;

    Ok(())
}

fn validate_ratio(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Scraper name: non-empty, alphanumeric + hyphens only
    if config.scraper_name.is_empty() {
        return Err(ConfigError::Validation(
            "scraper-name cannot be empty".to_string(),
        ));
    }

    if !config
        .scraper_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "scraper-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.scraper_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.root.is_empty() {
        return Err(ConfigError::Validation(
            "output root cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates seed entries
fn validate_seeds(seeds: &[SeedEntry]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[seed]] entry is required".to_string(),
        ));
    }

    for seed in seeds {
        if seed.region.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "seed '{}' has an empty region label",
                seed.url
            )));
        }

        let url = Url::parse(&seed.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed.url, e)))?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use HTTP(S)",
                seed.url
            )));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact-email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() || !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::OutputConfig;

    fn base_config() -> Config {
        Config {
            pipeline: PipelineConfig {
                politeness_interval_ms: 700,
                request_timeout_ms: 30_000,
                max_attempts: 3,
                retry_backoff_ms: 500,
                fetch_concurrency: 3,
                max_pages_per_seed: 50,
                max_failed_page_ratio: 0.5,
                max_rejection_ratio: 0.25,
                run_timeout_secs: None,
                purge_missing: false,
            },
            user_agent: UserAgentConfig {
                scraper_name: "WastemapBot".to_string(),
                scraper_version: "0.2".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            output: OutputConfig {
                root: "./data".to_string(),
            },
            seeds: vec![SeedEntry {
                region: "VIC".to_string(),
                url: "https://example.com/locations/?state=VIC".to_string(),
            }],
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_politeness_floor() {
        let mut config = base_config();
        config.pipeline.politeness_interval_ms = 50;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = base_config();
        config.pipeline.fetch_concurrency = 0;
        assert!(validate(&config).is_err());

        config.pipeline.fetch_concurrency = 9;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_ratio_bounds() {
        let mut config = base_config();
        config.pipeline.max_failed_page_ratio = 1.5;
        assert!(validate(&config).is_err());

        let mut config = base_config();
        config.pipeline.max_rejection_ratio = -0.1;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_seeds_required() {
        let mut config = base_config();
        config.seeds.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_seed_url_scheme() {
        let mut config = base_config();
        config.seeds[0].url = "ftp://example.com/".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    #[test]
    fn test_scraper_name_characters() {
        let mut config = base_config();
        config.user_agent.scraper_name = "Bad Name!".to_string();
        assert!(validate(&config).is_err());
    }
}
