use crate::crawler::Frontier;
use crate::output::Statistics;
use crate::robots::RobotsGate;
use std::collections::{BTreeMap, BTreeSet};

/// Cookies and local storage carried between requests to one domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    cookies: BTreeMap<String, String>,
    local_storage: BTreeMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges what a response returned; later values win
    pub fn merge(
        &mut self,
        cookies: &BTreeMap<String, String>,
        local_storage: &BTreeMap<String, String>,
    ) {
        self.cookies
            .extend(cookies.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.local_storage
            .extend(local_storage.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Value for a `Cookie` request header, if any cookies are held
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn local_storage(&self) -> &BTreeMap<String, String> {
        &self.local_storage
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.local_storage.is_empty()
    }
}

/// Tracks the state of one domain's crawl
///
/// Owned by that domain's coordinator; nothing else mutates it while the
/// crawl runs.
#[derive(Debug)]
pub struct DomainState {
    domain: String,
    concurrency: usize,
    frontier: Frontier,
    session: Session,
    stats: Statistics,
    products: BTreeSet<String>,
    robots: Option<RobotsGate>,
}

impl DomainState {
    pub fn new(domain: impl Into<String>, max_depth: u32, concurrency: usize) -> Self {
        Self {
            domain: domain.into(),
            concurrency: concurrency.max(1),
            frontier: Frontier::new(max_depth),
            session: Session::new(),
            stats: Statistics::new(),
            products: BTreeSet::new(),
            robots: None,
        }
    }

    /// Enables robots.txt checks for this domain
    pub fn with_robots(mut self, gate: RobotsGate) -> Self {
        self.robots = Some(gate);
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn max_depth(&self) -> u32 {
        self.frontier.max_depth()
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut Statistics {
        &mut self.stats
    }

    pub fn robots_mut(&mut self) -> Option<&mut RobotsGate> {
        self.robots.as_mut()
    }

    /// Records a product URL; returns false if it was already known
    pub fn record_product(&mut self, url: &str) -> bool {
        self.products.insert(url.to_string())
    }

    pub fn products(&self) -> &BTreeSet<String> {
        &self.products
    }

    /// Consumes the state, keeping what the orchestrator reports
    pub fn into_results(self) -> (BTreeSet<String>, Statistics) {
        (self.products, self.stats)
    }
}
