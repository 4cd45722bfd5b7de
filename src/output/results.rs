use crate::ScoutError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

/// Product URLs found per domain
///
/// Serializes as `{ "<domain>": ["<url>", ...] }` with both levels sorted,
/// so output is stable for a given set of discoveries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrawlResult(BTreeMap<String, BTreeSet<String>>);

impl CrawlResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures a domain has an entry even if nothing was found
    pub fn add_domain(&mut self, domain: &str) {
        self.0.entry(domain.to_string()).or_default();
    }

    /// Merges a domain's product URLs into the result
    pub fn extend(&mut self, domain: &str, urls: impl IntoIterator<Item = String>) {
        self.0.entry(domain.to_string()).or_default().extend(urls);
    }

    pub fn get(&self, domain: &str) -> Option<&BTreeSet<String>> {
        self.0.get(domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }

    pub fn domain_count(&self) -> usize {
        self.0.len()
    }

    /// Product URLs across all domains
    pub fn product_count(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }
}

/// Writes the results as pretty-printed JSON
pub fn write_results(results: &CrawlResult, path: &Path) -> Result<(), ScoutError> {
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(path, json)?;
    info!(
        "Wrote {} product URLs for {} domains to {}",
        results.product_count(),
        results.domain_count(),
        path.display()
    );
    Ok(())
}
