//! Per-domain fetch coordinator
//!
//! One coordinator drives one domain's crawl to completion:
//! - Pulls targets from the domain's frontier, shallowest first
//! - Checks robots.txt before anything touches the network
//! - Paces dispatches with a randomized delay (at least the robots crawl-delay)
//! - Runs up to `concurrent_requests` fetch tasks, each retrying transient failures
//! - Merges returned cookies into the session before the next dispatch
//! - Extracts, classifies and enqueues links from every fetched page
//!
//! Fetch tasks report back through a `JoinSet`; only the coordinator loop
//! touches the domain state.

use crate::config::Config;
use crate::crawler::extractor::{is_html, parse_page, scoped_links, LinkFilter};
use crate::crawler::fetcher::{FetchError, FetchRequest, FetchResponse, Fetcher};
use crate::crawler::frontier::{CrawlTarget, Dequeue};
use crate::crawler::headers::HeaderProvider;
use crate::crawler::retry::RetryPolicy;
use crate::output::{GlobalStats, Statistics};
use crate::rules::{LinkClass, RuleRegistry};
use crate::state::{DomainState, FailureKind, TargetState};
use crate::url::{extract_domain, normalize_url};
use crate::{ConfigError, ScoutError};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{sleep_until, Instant};
use url::Url;

/// Completed fetches between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Final state for a target whose task failed outside the fetch itself
const ABANDONED: TargetState = TargetState::Failed {
    kind: FailureKind::Permanent,
    terminal: true,
};

/// Shared, read-only collaborators for every domain's coordinator
#[derive(Clone)]
pub struct CrawlContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub rules: Arc<RuleRegistry>,
    pub headers: Arc<HeaderProvider>,
    pub retry: RetryPolicy,
    /// Politeness delay range in seconds
    pub delay_range: (f64, f64),
    pub use_js_rendering: bool,
    pub global: Arc<GlobalStats>,
}

impl CrawlContext {
    pub fn from_config(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<Self, ConfigError> {
        Ok(Self {
            fetcher,
            rules: Arc::new(RuleRegistry::from_config(&config.retailers)?),
            headers: Arc::new(HeaderProvider::from_config(config)),
            retry: RetryPolicy::from_config(&config.crawler),
            delay_range: config.crawler.delay_range,
            use_js_rendering: config.crawler.use_js_rendering,
            global: Arc::new(GlobalStats::new()),
        })
    }
}

/// What a finished domain crawl hands back
#[derive(Debug, Clone)]
pub struct DomainReport {
    pub domain: String,
    pub products: BTreeSet<String>,
    pub stats: Statistics,
    /// The crawl hit its deadline; results are partial
    pub timed_out: bool,
}

/// Result of one target's fetch, after retries
#[derive(Debug)]
struct Fetched {
    state: TargetState,
    result: Result<FetchResponse, FetchError>,
    retries: u32,
}

type TaskResult = (CrawlTarget, Result<Fetched, ScoutError>);

/// Drives one domain's crawl
pub struct Coordinator {
    state: DomainState,
    filter: LinkFilter,
    ctx: CrawlContext,
    completed: u64,
}

impl Coordinator {
    pub fn new(state: DomainState, filter: LinkFilter, ctx: CrawlContext) -> Self {
        Self {
            state,
            filter,
            ctx,
            completed: 0,
        }
    }

    /// Queues seed URLs at depth 0
    ///
    /// Seeds that already look like product pages are recorded right away.
    /// Returns the number of seeds queued.
    pub fn seed(&mut self, seeds: &[String]) -> usize {
        let mut queued = 0;
        for seed in seeds {
            let target = match CrawlTarget::new(self.state.domain(), seed, 0) {
                Ok(target) => target,
                Err(e) => {
                    tracing::warn!("[{}] Skipping seed {}: {}", self.state.domain(), seed, e);
                    continue;
                }
            };

            if self.classify(target.url()) == LinkClass::Product
                && self.state.record_product(target.url().as_str())
            {
                tracing::info!("Found product URL: {}", target.url());
            }

            if self.state.frontier().enqueue(target) {
                queued += 1;
            }
        }
        queued
    }

    /// Crawls until the frontier is quiescent or `deadline` passes
    ///
    /// On the deadline, queued targets are dropped and in-flight fetches are
    /// aborted; everything found so far is still reported.
    ///
    /// # Arguments
    ///
    /// * `deadline` - When this domain's crawl must stop; fetching robots.txt
    ///   and waiting out crawl-delays count against it
    ///
    /// # Returns
    ///
    /// The domain's product URLs and statistics, with `timed_out` set if the
    /// deadline cut the crawl short.
    pub async fn run(mut self, deadline: Instant) -> DomainReport {
        let domain = self.state.domain().to_string();
        tracing::info!(
            "[{}] Starting crawl (max depth {}, concurrency {})",
            domain,
            self.state.max_depth(),
            self.state.concurrency()
        );
        self.state.stats_mut().start();

        let semaphore = Arc::new(Semaphore::new(self.state.concurrency()));
        let mut tasks: JoinSet<TaskResult> = JoinSet::new();
        let mut last_dispatch: Option<Instant> = None;
        let mut timed_out = false;

        let expired = sleep_until(deadline);
        tokio::pin!(expired);

        loop {
            // Step 1: Apply finished fetches first so their links and cookies count
            while let Some(joined) = tasks.try_join_next() {
                self.handle_joined(joined);
            }

            if Instant::now() >= deadline {
                timed_out = true;
                break;
            }

            // Step 2: Next target, or wait for in-flight fetches to add some
            let target = match self.state.frontier().dequeue() {
                Dequeue::Ready(target) => target,
                Dequeue::Pending => {
                    tokio::select! {
                        Some(joined) = tasks.join_next() => self.handle_joined(joined),
                        _ = &mut expired => {
                            timed_out = true;
                            break;
                        }
                    }
                    continue;
                }
                Dequeue::Quiescent => break,
            };

            // Step 3: robots.txt may need fetching first; the deadline still applies
            let allowed = tokio::select! {
                allowed = self.allowed_by_robots(&target) => allowed,
                _ = &mut expired => {
                    self.state.frontier().complete();
                    timed_out = true;
                    break;
                }
            };
            if !allowed {
                self.record_outcome(TargetState::POLICY_DENIED);
                self.state.frontier().complete();
                continue;
            }

            // Step 4: Concurrency bound, then politeness delay
            let permit = tokio::select! {
                permit = semaphore.clone().acquire_owned() => permit,
                _ = &mut expired => {
                    self.state.frontier().complete();
                    timed_out = true;
                    break;
                }
            };
            let Ok(permit) = permit else {
                self.state.frontier().complete();
                break;
            };

            let delay = tokio::select! {
                delay = self.politeness_delay(&target) => delay,
                _ = &mut expired => {
                    self.state.frontier().complete();
                    timed_out = true;
                    break;
                }
            };
            if let Some(last) = last_dispatch {
                let wake = last.checked_add(delay).unwrap_or(deadline);
                tokio::select! {
                    _ = sleep_until(wake) => {}
                    _ = &mut expired => {
                        self.state.frontier().complete();
                        timed_out = true;
                        break;
                    }
                }
            }
            last_dispatch = Some(Instant::now());

            // Step 5: Fetch in the background
            self.dispatch(&mut tasks, target, permit);
        }

        if timed_out {
            let dropped = self.state.frontier().close();
            tracing::warn!(
                "[{}] Crawl timed out: {} queued targets dropped, {} fetches in flight aborted",
                domain,
                dropped,
                tasks.len()
            );
            tasks.abort_all();
        }

        // Collect whatever finished before the abort landed
        while let Some(joined) = tasks.join_next().await {
            self.handle_joined(joined);
        }

        self.state.stats_mut().finish();
        let stats = self.state.stats().clone();
        tracing::info!(
            "[{}] Crawl finished: {} requests ({} ok, {} failed), {} product URLs in {:.1}s",
            domain,
            stats.total_requests(),
            stats.successful_requests(),
            stats.failed_requests(),
            self.state.products().len(),
            stats.duration_seconds()
        );
        let visited = self.state.frontier().visited_count();
        let robots_origins = self
            .state
            .robots_mut()
            .map_or(0, |gate| gate.cached_origins());
        tracing::debug!(
            "[{}] {} URLs seen, robots.txt consulted for {} origins",
            domain,
            visited,
            robots_origins
        );

        let (products, stats) = self.state.into_results();
        DomainReport {
            domain,
            products,
            stats,
            timed_out,
        }
    }

    /// Returns false, and logs, if robots.txt denies the target
    async fn allowed_by_robots(&mut self, target: &CrawlTarget) -> bool {
        let Some(gate) = self.state.robots_mut() else {
            return true;
        };

        if gate.is_allowed(target.url()).await {
            return true;
        }

        tracing::info!(
            "URL {} disallowed by robots.txt ({})",
            target.url(),
            TargetState::POLICY_DENIED
        );
        false
    }

    /// Randomized delay before the next dispatch, at least the crawl-delay
    async fn politeness_delay(&mut self, target: &CrawlTarget) -> Duration {
        let (min, max) = self.ctx.delay_range;
        let seconds = if max > min {
            min + fastrand::f64() * (max - min)
        } else {
            min
        };
        let delay = Duration::try_from_secs_f64(seconds).unwrap_or_default();

        match self.state.robots_mut() {
            Some(gate) => match gate.crawl_delay(target.url()).await {
                Some(crawl_delay) => delay.max(crawl_delay),
                None => delay,
            },
            None => delay,
        }
    }

    fn dispatch(
        &self,
        tasks: &mut JoinSet<TaskResult>,
        target: CrawlTarget,
        permit: OwnedSemaphorePermit,
    ) {
        tracing::debug!("Fetching {} (depth {})", target.url(), target.depth());

        let request = FetchRequest {
            url: target.url().clone(),
            headers: self.ctx.headers.headers_for(self.state.domain()),
            use_js_rendering: self.ctx.use_js_rendering,
            session: self.state.session().clone(),
        };
        let fetcher = self.ctx.fetcher.clone();
        let retry = self.ctx.retry;

        tasks.spawn(async move {
            let fetched = fetch_with_retry(fetcher.as_ref(), &request, retry).await;
            drop(permit);
            (target, fetched)
        });
    }

    fn handle_joined(&mut self, joined: Result<TaskResult, JoinError>) {
        self.state.frontier().complete();

        match joined {
            Ok((target, Ok(fetched))) => self.handle_fetched(target, fetched),
            Ok((target, Err(e))) => {
                tracing::error!("Error processing {}: {}", target.url(), e);
                self.record_outcome(ABANDONED);
            }
            // Aborted on timeout: never finished, so never counted
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                tracing::error!("[{}] Fetch task panicked: {}", self.state.domain(), e);
                self.record_outcome(ABANDONED);
            }
        }

        self.completed += 1;
        if self.completed % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "[{}] Progress: {} fetches completed, {} in frontier, {} product URLs",
                self.state.domain(),
                self.completed,
                self.state.frontier().pending(),
                self.state.products().len()
            );
        }
    }

    fn handle_fetched(&mut self, target: CrawlTarget, fetched: Fetched) {
        let response = match fetched.result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch {} after {} attempts ({}): {}",
                    target.url(),
                    fetched.retries + 1,
                    fetched.state,
                    e
                );
                self.record_outcome(fetched.state);
                return;
            }
        };

        self.record_outcome(fetched.state);
        self.state
            .session_mut()
            .merge(&response.cookies, &response.local_storage);

        // A redirect lands on a page that must not be queued again
        if let Ok(final_url) = normalize_url(response.final_url.as_str()) {
            if final_url != *target.url() {
                self.state.frontier().mark_visited(&final_url);
            }
        }

        if !is_html(response.content_type.as_deref()) {
            tracing::debug!(
                "Skipping link extraction for {} ({})",
                target.url(),
                response.content_type.as_deref().unwrap_or("unknown type")
            );
            return;
        }

        let page = match parse_page(&response.body, &response.final_url) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Failed to parse content of {}: {}", target.url(), e);
                return;
            }
        };

        if target.depth() >= self.state.max_depth() {
            return;
        }

        for link in scoped_links(&page, &self.filter) {
            match self.classify(&link) {
                LinkClass::Product => {
                    if self.state.record_product(link.as_str()) {
                        tracing::info!("Found product URL: {}", link);
                    }
                    self.state.frontier().enqueue(target.child(link));
                }
                LinkClass::Pagination => {
                    self.state.frontier().enqueue(target.child(link));
                }
                LinkClass::Irrelevant => {
                    tracing::trace!("Discarding {}", link);
                }
            }
        }
    }

    /// Classifies with the rules of the link's own host
    fn classify(&self, url: &Url) -> LinkClass {
        let host = extract_domain(url).unwrap_or_else(|| self.state.domain().to_string());
        self.ctx.rules.classify(&host, url.as_str())
    }

    /// Counts a target's final state; the state decides what it counts as
    fn record_outcome(&mut self, state: TargetState) {
        if state == TargetState::Succeeded {
            self.state.stats_mut().record_success();
            self.ctx.global.record_success();
        } else if state.counts_as_failure() {
            self.state.stats_mut().record_failure();
            self.ctx.global.record_failure();
        }
    }
}

/// Fetches one target, retrying transient failures with backoff
///
/// Permanent failures get a single attempt.
async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    request: &FetchRequest,
    retry: RetryPolicy,
) -> Result<Fetched, ScoutError> {
    let mut state = TargetState::Queued.transition(TargetState::Fetching)?;
    let mut retries = 0;

    loop {
        match fetcher.fetch(request).await {
            Ok(response) => {
                state = state.transition(TargetState::Succeeded)?;
                return Ok(Fetched {
                    state,
                    result: Ok(response),
                    retries,
                });
            }
            Err(e) if e.is_transient() && retry.should_retry(retries) => {
                state = state.transition(TargetState::Failed {
                    kind: FailureKind::Transient,
                    terminal: false,
                })?;
                let delay = retry.delay_for(retries);
                tracing::debug!(
                    "Transient failure for {} ({}); retry {}/{} in {:?}",
                    request.url,
                    e,
                    retries + 1,
                    retry.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
                retries += 1;
                state = state.transition(TargetState::Fetching)?;
            }
            Err(e) => {
                let kind = if e.is_transient() {
                    FailureKind::Transient
                } else {
                    FailureKind::Permanent
                };
                state = state.transition(TargetState::Failed {
                    kind,
                    terminal: true,
                })?;
                return Ok(Fetched {
                    state,
                    result: Err(e),
                    retries,
                });
            }
        }
    }
}
