//! Link classification
//!
//! Decides whether a URL is a product page, a listing page worth following,
//! or neither. Each retailer gets a [`RetailerRuleSet`]; the registry maps
//! domains to rule sets and falls back to generic heuristics for sites it
//! does not know.

mod builtin;
mod retailer;

pub use retailer::RetailerRuleSet;

use crate::config::RetailerEntry;
use crate::url::bare_host;
use crate::ConfigError;
use std::collections::HashMap;
use std::fmt;
use url::Url;

/// Classification of a discovered link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkClass {
    /// A product detail page: recorded and crawled
    Product,
    /// A listing, category or search page: crawled only
    Pagination,
    /// Anything else: discarded
    Irrelevant,
}

impl fmt::Display for LinkClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product => write!(f, "product"),
            Self::Pagination => write!(f, "pagination"),
            Self::Irrelevant => write!(f, "irrelevant"),
        }
    }
}

/// Registry of retailer rule sets with a generic fallback
///
/// Read-only once built; coordinators share it through an `Arc`.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    /// Keyed by bare domain (no "*." or "www.")
    sets: HashMap<String, RetailerRuleSet>,
    fallback: RetailerRuleSet,
}

impl RuleRegistry {
    /// A registry holding only the generic fallback
    pub fn generic() -> Result<Self, ConfigError> {
        let (pattern, product, pagination, exclusions) = builtin::GENERIC;
        Ok(Self {
            sets: HashMap::new(),
            fallback: RetailerRuleSet::new(pattern, product, pagination, exclusions)?,
        })
    }

    /// The generic fallback plus the built-in retailer rule sets
    pub fn builtin() -> Result<Self, ConfigError> {
        let mut registry = Self::generic()?;
        for &(pattern, product, pagination, exclusions) in builtin::RETAILERS {
            registry.register(RetailerRuleSet::new(
                pattern,
                product,
                pagination,
                exclusions,
            )?);
        }
        Ok(registry)
    }

    /// Built-in rules overridden by the `[[retailers]]` config entries
    pub fn from_config(entries: &[RetailerEntry]) -> Result<Self, ConfigError> {
        let mut registry = Self::builtin()?;
        for entry in entries {
            registry.register(RetailerRuleSet::from_entry(entry)?);
        }
        Ok(registry)
    }

    /// Adds a rule set, replacing any set registered for the same domain
    pub fn register(&mut self, rules: RetailerRuleSet) {
        let key = registry_key(rules.pattern());
        self.sets.insert(key, rules);
    }

    /// Number of retailer-specific rule sets
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Finds the rule set for a domain
    ///
    /// Walks from the full host up through its parent domains. A rule set
    /// registered with a wildcard pattern covers subdomains; an exact one
    /// only its own host.
    pub fn lookup(&self, domain: &str) -> &RetailerRuleSet {
        let host = bare_host(domain);
        let mut candidate = host;

        loop {
            if let Some(rules) = self.sets.get(candidate) {
                if candidate == host || rules.pattern().starts_with("*.") {
                    return rules;
                }
            }
            match candidate.split_once('.') {
                Some((_, parent)) => candidate = parent,
                None => return &self.fallback,
            }
        }
    }

    /// Classifies a URL found while crawling `domain`
    ///
    /// Pure and deterministic. URLs that fail to parse, or are not http(s),
    /// are `Irrelevant`.
    ///
    /// # Arguments
    ///
    /// * `domain` - The domain being crawled; picks the retailer rule set
    /// * `url` - The absolute URL to classify
    ///
    /// # Returns
    ///
    /// * `LinkClass::Product` - A product page, recorded and followed
    /// * `LinkClass::Pagination` - A listing page, followed for more links
    /// * `LinkClass::Irrelevant` - Not followed
    pub fn classify(&self, domain: &str, url: &str) -> LinkClass {
        // Step 1: Only http(s) URLs can match
        let parsed = match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
            _ => return LinkClass::Irrelevant,
        };

        // Step 2: Rules match against path plus query
        let target = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        };

        // Step 3: Most specific rule set for the domain, else the fallback
        self.lookup(domain).classify_target(&target)
    }
}

fn registry_key(pattern: &str) -> String {
    let pattern = pattern.strip_prefix("*.").unwrap_or(pattern);
    bare_host(pattern).to_lowercase()
}
