use crate::crawler::{FetchRequest, Fetcher};
use crate::robots::ParsedRobots;
use crate::state::Session;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Lazily fetched robots.txt policies for one domain's crawl
///
/// Each origin's policy is fetched on first use and kept for the rest of the
/// crawl. Any failure to fetch it (network error, non-2xx) allows everything
/// with no extra delay.
pub struct RobotsGate {
    fetcher: Arc<dyn Fetcher>,
    robots_token: String,
    headers: BTreeMap<String, String>,
    policies: HashMap<String, ParsedRobots>,
}

impl RobotsGate {
    /// `headers` are sent with every robots.txt request
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        robots_token: impl Into<String>,
        headers: BTreeMap<String, String>,
    ) -> Self {
        Self {
            fetcher,
            robots_token: robots_token.into(),
            headers,
            policies: HashMap::new(),
        }
    }

    /// Checks whether `url` may be fetched
    pub async fn is_allowed(&mut self, url: &Url) -> bool {
        let token = self.robots_token.clone();
        self.policy(url).await.is_allowed(url.as_str(), &token)
    }

    /// Minimum delay between requests declared for the URL's origin
    pub async fn crawl_delay(&mut self, url: &Url) -> Option<Duration> {
        let token = self.robots_token.clone();
        self.policy(url).await.crawl_delay(&token)
    }

    /// Number of origins whose policy has been fetched
    pub fn cached_origins(&self) -> usize {
        self.policies.len()
    }

    async fn policy(&mut self, url: &Url) -> &ParsedRobots {
        let origin = url.origin().ascii_serialization();
        if !self.policies.contains_key(&origin) {
            let robots = self.fetch_policy(url).await;
            self.policies.insert(origin.clone(), robots);
        }
        &self.policies[&origin]
    }

    async fn fetch_policy(&self, url: &Url) -> ParsedRobots {
        let robots_url = match url.join("/robots.txt") {
            Ok(robots_url) => robots_url,
            Err(e) => {
                warn!("Cannot build robots.txt URL for {}: {}", url, e);
                return ParsedRobots::allow_all();
            }
        };

        let request = FetchRequest {
            url: robots_url.clone(),
            headers: self.headers.clone(),
            use_js_rendering: false,
            session: Session::default(),
        };

        match self.fetcher.fetch(&request).await {
            Ok(response) => {
                debug!(
                    "Fetched {} ({} bytes)",
                    robots_url,
                    response.body.len()
                );
                ParsedRobots::from_content(&response.body)
            }
            Err(e) => {
                debug!("No usable robots.txt at {} ({}); allowing all", robots_url, e);
                ParsedRobots::allow_all()
            }
        }
    }
}

impl fmt::Debug for RobotsGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RobotsGate")
            .field("robots_token", &self.robots_token)
            .field("origins", &self.policies.keys().collect::<Vec<_>>())
            .finish()
    }
}
