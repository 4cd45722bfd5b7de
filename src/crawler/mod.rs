//! Crawler module for page fetching and link discovery
//!
//! This module contains the core crawling logic, including:
//! - The fetch collaborator trait and its HTTP implementation
//! - The per-domain frontier with URL dedup and depth limits
//! - Link extraction and scoping
//! - Per-domain coordination with retries and politeness delays
//! - Orchestration of all domains in one run

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod headers;
mod orchestrator;
mod retry;

pub use coordinator::{Coordinator, CrawlContext, DomainReport};
pub use extractor::{
    extract_links, is_html, parse_page, scoped_links, ExtractError, LinkFilter, ParsedPage,
};
pub use fetcher::{FetchError, FetchRequest, FetchResponse, Fetcher, HttpFetcher};
pub use frontier::{CrawlTarget, Dequeue, Frontier};
pub use headers::HeaderProvider;
pub use orchestrator::{run, CrawlReport};
pub use retry::RetryPolicy;

use crate::config::Config;
use crate::ScoutError;
use std::sync::Arc;

/// Runs a complete crawl over HTTP
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration
/// 2. Build the HTTP fetcher
/// 3. Crawl every domain concurrently, each within its own deadline
/// 4. Return the product URLs and request statistics
///
/// # Arguments
///
/// * `config` - The crawl configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran to completion or to its deadlines
/// * `Err(ScoutError)` - Invalid configuration or the HTTP client could not
///   be built
pub async fn crawl(config: &Config) -> Result<CrawlReport, ScoutError> {
    crate::config::validate(config)?;
    let fetcher = HttpFetcher::new(&config.crawler)?;
    run(config, Arc::new(fetcher)).await
}
