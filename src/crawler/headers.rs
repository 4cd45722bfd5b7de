//! Request header construction
//!
//! Every fetch carries a browser-like header set so retailers serve the same
//! markup a shopper would see. `Accept-Encoding` is left to reqwest, which
//! advertises gzip and brotli and only decodes bodies when it set the header
//! itself.

use crate::config::Config;
use chrono::Utc;
use std::collections::BTreeMap;

/// Browser user agents picked from when rotation is on
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.80",
];

const DEFAULT_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("DNT", "1"),
    ("Connection", "keep-alive"),
    ("Upgrade-Insecure-Requests", "1"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("Cache-Control", "max-age=0"),
];

/// Builds the header set for each request
#[derive(Debug, Clone)]
pub struct HeaderProvider {
    rotate: bool,
    default_agent: String,
    custom: BTreeMap<String, String>,
}

impl HeaderProvider {
    pub fn new(rotate: bool, default_agent: impl Into<String>) -> Self {
        Self {
            rotate,
            default_agent: default_agent.into(),
            custom: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.user_agent.rotate, config.user_agent.default.clone())
            .with_custom_headers(config.headers.clone())
    }

    /// Headers merged over the defaults on every request
    pub fn with_custom_headers(mut self, custom: BTreeMap<String, String>) -> Self {
        self.custom = custom;
        self
    }

    /// The user agent for the next request
    pub fn user_agent(&self) -> String {
        if self.rotate {
            USER_AGENTS[fastrand::usize(..USER_AGENTS.len())].to_string()
        } else {
            self.default_agent.clone()
        }
    }

    /// Headers for one request to `domain`
    ///
    /// Order of precedence, lowest first: browser defaults, user agent and
    /// referer, custom headers. The request timestamp is always added last.
    pub fn headers_for(&self, domain: &str) -> BTreeMap<String, String> {
        let mut headers: BTreeMap<String, String> = DEFAULT_HEADERS
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        headers.insert("User-Agent".to_string(), self.user_agent());
        headers.insert("Referer".to_string(), format!("https://{}", domain));

        for (name, value) in &self.custom {
            headers.insert(name.clone(), value.clone());
        }

        let now = Utc::now();
        headers.insert(
            "X-Request-Timestamp".to_string(),
            format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros()),
        );

        headers
    }
}
