use crate::config::types::{Config, CrawlerConfig, DomainEntry, UserAgentConfig};
use crate::rules::RetailerRuleSet;
use crate::url::{extract_domain, scope_of};
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use std::collections::{BTreeMap, HashSet};
use url::Url;

/// Validates the entire configuration
///
/// Runs before any crawl starts; an invalid configuration is the only
/// error that aborts a whole run.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_headers(&config.headers)?;

    if config.output.results_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "results-path cannot be empty".to_string(),
        ));
    }

    validate_domains(&config.domains)?;

    for entry in &config.retailers {
        validate_domain_pattern(&entry.domain)?;
        RetailerRuleSet::from_entry(entry)?;
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.concurrent_requests < 1 || config.concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrent-requests must be between 1 and 100, got {}",
            config.concurrent_requests
        )));
    }

    let (min, max) = config.delay_range;
    if !min.is_finite() || !max.is_finite() || min < 0.0 || max < min {
        return Err(ConfigError::Validation(format!(
            "delay-range must satisfy 0 <= min <= max, got [{}, {}]",
            min, max
        )));
    }

    if config.domain_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "domain-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.retry_base_delay_ms > config.retry_max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "retry-base-delay-ms ({}) cannot exceed retry-max-delay-ms ({})",
            config.retry_base_delay_ms, config.retry_max_delay_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if !config.rotate && config.default.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent default cannot be empty when rotation is off".to_string(),
        ));
    }

    // robots.txt product tokens are letters, digits, '-' and '_'
    if config.robots_token.is_empty()
        || !config
            .robots_token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "robots-token must be a non-empty product token, got '{}'",
            config.robots_token
        )));
    }

    Ok(())
}

/// Validates that custom headers are legal HTTP headers
fn validate_headers(headers: &BTreeMap<String, String>) -> Result<(), ConfigError> {
    for (name, value) in headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::Validation(format!("Invalid header name '{}'", name)))?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!("Invalid value for header '{}'", name))
        })?;
    }
    Ok(())
}

/// Validates the domain list and each entry's seeds
fn validate_domains(domains: &[DomainEntry]) -> Result<(), ConfigError> {
    if domains.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[domains]] entry is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in domains {
        validate_domain_string(&entry.domain)?;

        if !seen.insert(entry.domain.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Domain '{}' is listed more than once",
                entry.domain
            )));
        }

        for pattern in &entry.also_allow {
            validate_domain_pattern(pattern)?;
        }

        for seed in entry.seed_urls() {
            validate_seed(entry, &seed)?;
        }
    }

    Ok(())
}

/// Validates a seed URL: http(s), and on the domain (or an allowed host)
fn validate_seed(entry: &DomainEntry, seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use http or https",
            seed
        )));
    }

    let host = extract_domain(&url)
        .ok_or_else(|| ConfigError::InvalidUrl(format!("Seed URL '{}' has no host", seed)))?;

    if !scope_of(&host, &entry.domain, &entry.also_allow).is_followable() {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' is outside domain '{}'",
            seed, entry.domain
        )));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    validate_domain_string(pattern.strip_prefix("*.").unwrap_or(pattern))
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' is malformed",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'shop.com')",
            domain
        )));
    }

    Ok(())
}
