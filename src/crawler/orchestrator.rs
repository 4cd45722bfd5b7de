//! Crawl orchestration across domains
//!
//! Every configured domain gets its own coordinator, state and deadline. The
//! coordinators run concurrently and never share mutable state, so a slow or
//! failing domain cannot hold up or corrupt another one.

use crate::config::{validate, Config, DomainEntry};
use crate::crawler::coordinator::{Coordinator, CrawlContext, DomainReport};
use crate::crawler::extractor::LinkFilter;
use crate::crawler::fetcher::Fetcher;
use crate::output::{CrawlResult, StatsSummary};
use crate::robots::RobotsGate;
use crate::state::DomainState;
use crate::ScoutError;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant as StdInstant;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Product URLs per domain; every configured domain has an entry
    pub results: CrawlResult,
    pub domains: BTreeMap<String, StatsSummary>,
    pub totals: StatsSummary,
    /// Domains whose crawl hit its deadline; their results are partial
    pub timed_out: BTreeSet<String>,
}

/// Crawls every configured domain concurrently
///
/// The configuration is validated before anything is fetched; that is the
/// only error that aborts the run. Failures inside a domain's crawl are
/// counted in its statistics instead.
///
/// # Arguments
///
/// * `config` - The crawl configuration
/// * `fetcher` - Fetches every page and robots.txt file
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Product URLs and statistics, including partial
///   results from domains that timed out
/// * `Err(ScoutError)` - The configuration was invalid
pub async fn run(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<CrawlReport, ScoutError> {
    // Step 1: Reject bad configuration before any request
    validate(config)?;

    let ctx = CrawlContext::from_config(config, fetcher)?;
    let started = StdInstant::now();

    tracing::info!(
        "Starting crawl of {} domains (max depth {}, {} concurrent requests per domain)",
        config.domains.len(),
        config.crawler.max_depth,
        config.crawler.concurrent_requests
    );

    // Step 2: One coordinator per domain, each with its own deadline
    let mut results = CrawlResult::new();
    let mut tasks = JoinSet::new();

    for entry in &config.domains {
        results.add_domain(&entry.domain);

        let mut coordinator = build_coordinator(config, entry, ctx.clone());
        let queued = coordinator.seed(&entry.seed_urls());
        tracing::debug!("[{}] {} seed URLs queued", entry.domain, queued);

        let deadline = Instant::now() + config.crawler.domain_timeout();
        tasks.spawn(coordinator.run(deadline));
    }

    // Step 3: Fold each domain's report in as it finishes
    let mut domains = BTreeMap::new();
    let mut timed_out = BTreeSet::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(DomainReport {
                domain,
                products,
                stats,
                timed_out: hit_deadline,
            }) => {
                results.extend(&domain, products);
                if hit_deadline {
                    timed_out.insert(domain.clone());
                }
                domains.insert(domain, stats.summary());
            }
            Err(e) => {
                // The domain still appears in the results, just empty
                tracing::error!("Domain crawl task failed: {}", e);
            }
        }
    }

    let totals = ctx.global.summary(started.elapsed().as_secs_f64());
    tracing::info!(
        "Crawl complete: {} product URLs across {} domains ({} requests, {} failed)",
        results.product_count(),
        results.domain_count(),
        totals.total_requests,
        totals.failed_requests
    );

    Ok(CrawlReport {
        results,
        domains,
        totals,
        timed_out,
    })
}

fn build_coordinator(config: &Config, entry: &DomainEntry, ctx: CrawlContext) -> Coordinator {
    let mut state = DomainState::new(
        entry.domain.as_str(),
        config.crawler.max_depth,
        config.crawler.concurrent_requests as usize,
    );

    if config.crawler.respect_robots {
        let gate = RobotsGate::new(
            ctx.fetcher.clone(),
            config.user_agent.robots_token.as_str(),
            ctx.headers.headers_for(&entry.domain),
        );
        state = state.with_robots(gate);
    }

    let filter = LinkFilter::new(entry.domain.as_str(), entry.also_allow.clone());
    Coordinator::new(state, filter, ctx)
}
