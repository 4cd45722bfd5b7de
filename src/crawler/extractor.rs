//! Link extraction
//!
//! This module turns fetched HTML into the normalized, in-scope URLs the
//! coordinator classifies and feeds back into the frontier:
//! - Links from `<a href>` and `<link rel="canonical">`
//! - Resolution against the page URL, or its `<base href>`
//! - Scope filtering (own domain plus any allowed hosts)
//! - Normalization and de-duplication

use crate::url::{extract_domain, normalize_url, scope_of};
use scraper::{Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Content that cannot be treated as markup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("content contains NUL bytes; not a text document")]
    Binary,

    #[error("failed to build selector: {0}")]
    Selector(String),
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Absolute http(s) links in document order, before scoping
    pub links: Vec<Url>,
}

/// Which hosts a domain's crawl may follow links into
#[derive(Debug, Clone)]
pub struct LinkFilter {
    domain: String,
    also_allow: Vec<String>,
}

impl LinkFilter {
    pub fn new(domain: impl Into<String>, also_allow: Vec<String>) -> Self {
        Self {
            domain: domain.into(),
            also_allow,
        }
    }

    /// Same-domain only
    pub fn same_domain(domain: impl Into<String>) -> Self {
        Self::new(domain, Vec::new())
    }

    pub fn allows(&self, url: &Url) -> bool {
        extract_domain(url)
            .map(|host| scope_of(&host, &self.domain, &self.also_allow).is_followable())
            .unwrap_or(false)
    }
}

/// Parses HTML and collects its links
///
/// html5ever recovers from any tag soup, so the only rejected content is
/// content that is not text at all.
pub fn parse_page(content: &str, base_url: &Url) -> Result<ParsedPage, ExtractError> {
    if content.contains('\0') {
        return Err(ExtractError::Binary);
    }

    let document = Html::parse_document(content);
    let base = document_base(&document, base_url)?;

    let mut links = Vec::new();
    for (selector, skip_downloads) in [("a[href]", true), ("link[rel='canonical'][href]", false)] {
        let selector = parse_selector(selector)?;
        for element in document.select(&selector) {
            if skip_downloads && element.value().attr("download").is_some() {
                continue;
            }
            if let Some(url) = element.value().attr("href").and_then(|href| resolve_link(href, &base)) {
                links.push(url);
            }
        }
    }

    Ok(ParsedPage { links })
}

/// Normalizes a page's links and keeps the in-scope ones, first occurrence wins
pub fn scoped_links(page: &ParsedPage, filter: &LinkFilter) -> Vec<Url> {
    let mut seen = HashSet::new();
    page.links
        .iter()
        .filter(|url| filter.allows(url))
        .filter_map(|url| normalize_url(url.as_str()).ok())
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

/// Extracts normalized in-scope links; unusable content yields none
///
/// # Arguments
///
/// * `base_url` - The page's URL, for resolving relative links
/// * `content` - The page's HTML
/// * `filter` - Which hosts the crawl may follow
///
/// # Returns
///
/// Deduplicated, normalized links in document order. Binary or otherwise
/// unparseable content yields an empty list.
///
/// # Example
///
/// ```
/// use product_scout::crawler::{extract_links, LinkFilter};
/// use url::Url;
///
/// let base = Url::parse("https://shop.example/category/shoes").unwrap();
/// let html = r#"<a href="/p/123?utm_source=mail">Shoe</a><a href="https://other.example/">x</a>"#;
/// let links = extract_links(&base, html, &LinkFilter::same_domain("shop.example"));
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://shop.example/p/123");
/// ```
pub fn extract_links(base_url: &Url, content: &str, filter: &LinkFilter) -> Vec<Url> {
    parse_page(content, base_url)
        .map(|page| scoped_links(&page, filter))
        .unwrap_or_default()
}

/// Returns true if a Content-Type names an HTML document
///
/// A missing header is given the benefit of the doubt.
pub fn is_html(content_type: Option<&str>) -> bool {
    content_type.map_or(true, |ct| ct.to_ascii_lowercase().contains("html"))
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector(e.to_string()))
}

/// The URL relative links resolve against: `<base href>` if present
fn document_base(document: &Html, page_url: &Url) -> Result<Url, ExtractError> {
    let selector = parse_selector("base[href]")?;
    Ok(document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone()))
}

/// Resolves an href to an absolute http(s) URL
///
/// Returns None for empty and fragment-only hrefs, other schemes
/// (javascript:, mailto:, tel:, data:) and anything unparseable.
fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    base.join(href)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}
