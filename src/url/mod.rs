//! URL handling module for Product-Scout
//!
//! This module provides URL normalization, domain extraction, wildcard matching,
//! and link scoping relative to the domain being crawled.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{bare_host, extract_domain, normalize_domain};
pub use matcher::matches_wildcard;
pub use normalize::normalize_url;

/// Where a discovered link points, relative to the crawl that found it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkScope {
    /// Same site as the crawl domain (including its subdomains)
    Own,
    /// Another host explicitly allowed for cross-domain discovery
    Allowed,
    /// Any other host - dropped
    Foreign,
}

impl LinkScope {
    /// Returns true if links with this scope may be followed
    pub fn is_followable(&self) -> bool {
        matches!(self, Self::Own | Self::Allowed)
    }
}

/// Classifies a link host relative to the crawl domain
///
/// Checked in priority order:
/// 1. The crawl domain itself or one of its subdomains
/// 2. A host matching one of the `also_allow` patterns
/// 3. Foreign (default)
///
/// # Examples
///
/// ```
/// use product_scout::url::{scope_of, LinkScope};
///
/// let allow = vec!["*.ebaystatic.com".to_string()];
/// assert_eq!(scope_of("www.ebay.com", "ebay.com", &allow), LinkScope::Own);
/// assert_eq!(scope_of("ir.ebaystatic.com", "ebay.com", &allow), LinkScope::Allowed);
/// assert_eq!(scope_of("google.com", "ebay.com", &allow), LinkScope::Foreign);
/// ```
pub fn scope_of(host: &str, crawl_domain: &str, also_allow: &[String]) -> LinkScope {
    let own_pattern = format!("*.{}", bare_host(crawl_domain));
    if matches_wildcard(&own_pattern, host) {
        return LinkScope::Own;
    }

    if also_allow
        .iter()
        .any(|pattern| matches_wildcard(pattern, host))
    {
        return LinkScope::Allowed;
    }

    LinkScope::Foreign
}
