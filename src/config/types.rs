use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Product-Scout
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    /// Extra request headers merged over the defaults
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub domains: Vec<DomainEntry>,
    #[serde(default)]
    pub retailers: Vec<RetailerEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum link depth from the seed URLs (seeds are depth 0)
    pub max_depth: u32,

    /// Maximum number of concurrent fetches per domain
    pub concurrent_requests: u32,

    /// Randomized pause between fetches, as [min, max] seconds
    pub delay_range: (f64, f64),

    /// Wall-clock budget for one domain's crawl
    pub domain_timeout_secs: u64,

    /// Total timeout for a single HTTP request
    pub request_timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,

    /// First backoff delay; doubles on every retry
    pub retry_base_delay_ms: u64,

    /// Cap on the backoff delay
    pub retry_max_delay_ms: u64,

    /// Whether robots.txt is fetched and obeyed
    pub respect_robots: bool,

    /// Ask the fetch backend to render JavaScript
    pub use_js_rendering: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            concurrent_requests: 10,
            delay_range: (1.0, 3.0),
            domain_timeout_secs: 300,
            request_timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: 10_000,
            respect_robots: true,
            use_js_rendering: false,
        }
    }
}

impl CrawlerConfig {
    pub fn domain_timeout(&self) -> Duration {
        Duration::from_secs(self.domain_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// User agent configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserAgentConfig {
    /// Pick a random browser user agent for every request
    pub rotate: bool,

    /// User agent sent when rotation is off
    pub default: String,

    /// Product token matched against robots.txt user-agent groups
    pub robots_token: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            rotate: true,
            default: "ProductScout/0.1 (+https://github.com/product-scout)".to_string(),
            robots_token: "ProductScout".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Path of the JSON file with discovered product URLs
    pub results_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: "product_urls.json".to_string(),
        }
    }
}

/// A domain to crawl
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DomainEntry {
    /// Bare domain (e.g., "argos.co.uk"); scheme and trailing slash are stripped on load
    pub domain: String,

    /// Seed URLs; defaults to the domain's https root
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Additional host patterns this crawl may follow links into
    #[serde(default)]
    pub also_allow: Vec<String>,
}

impl DomainEntry {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            seeds: Vec::new(),
            also_allow: Vec::new(),
        }
    }

    /// The configured seeds, or the domain root when none are given
    pub fn seed_urls(&self) -> Vec<String> {
        if self.seeds.is_empty() {
            vec![format!("https://{}/", self.domain)]
        } else {
            self.seeds.clone()
        }
    }
}

/// Retailer-specific URL rules supplied in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct RetailerEntry {
    /// Domain pattern (e.g., "shop.example" or "*.shop.example")
    pub domain: String,

    /// Regexes matching product page URLs (path and query)
    #[serde(default)]
    pub product: Vec<String>,

    /// Regexes matching listing/pagination pages worth following
    #[serde(default)]
    pub pagination: Vec<String>,

    /// Regexes for links that are never followed
    #[serde(default)]
    pub exclude: Vec<String>,
}
