//! Integration tests for multi-domain orchestration
//!
//! These tests drive `run` with an in-memory site map instead of HTTP, so
//! timing, failures and fetch counts are fully controlled.

use async_trait::async_trait;
use product_scout::config::{Config, CrawlerConfig, DomainEntry, UserAgentConfig};
use product_scout::crawler::{run, FetchError, FetchRequest, FetchResponse, Fetcher};
use product_scout::ScoutError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

enum Page {
    Html(&'static str),
    Status(u16),
    /// Responds only after the delay
    Slow(Duration, &'static str),
}

/// An in-memory web: unknown URLs are 404
#[derive(Default)]
struct SiteMap {
    pages: HashMap<String, Page>,
    calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl SiteMap {
    fn page(mut self, url: &str, page: Page) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Most fetches ever running at the same time
    fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for SiteMap {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let url = request.url.to_string();
        *self.calls.lock().unwrap().entry(url.clone()).or_insert(0) += 1;

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        let response = match self.pages.get(&url) {
            Some(Page::Html(body)) => Ok(FetchResponse::html(request.url.clone(), *body)),
            Some(Page::Status(status)) => Err(FetchError::Http { status: *status }),
            Some(Page::Slow(delay, body)) => {
                tokio::time::sleep(*delay).await;
                Ok(FetchResponse::html(request.url.clone(), *body))
            }
            None => Err(FetchError::Http { status: 404 }),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

fn test_config(domains: &[&str]) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth: 3,
            concurrent_requests: 4,
            delay_range: (0.0, 0.0),
            domain_timeout_secs: 30,
            request_timeout_secs: 5,
            max_retries: 2,
            retry_base_delay_ms: 1,
            retry_max_delay_ms: 5,
            respect_robots: true,
            use_js_rendering: false,
        },
        user_agent: UserAgentConfig {
            rotate: false,
            default: "TestBot/1.0".to_string(),
            robots_token: "TestBot".to_string(),
        },
        domains: domains.iter().map(|d| DomainEntry::new(*d)).collect(),
        ..Config::default()
    }
}

fn products(report: &product_scout::CrawlReport, domain: &str) -> Vec<String> {
    report
        .results
        .get(domain)
        .map(|urls| urls.iter().cloned().collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_domains_are_crawled_independently() {
    let site = Arc::new(
        SiteMap::default()
            .page(
                "https://alpha.example/",
                Page::Html(r#"<a href="/p/1111">A</a><a href="https://beta.example/p/2222">B</a>"#),
            )
            .page("https://alpha.example/p/1111", Page::Html("A"))
            .page("https://beta.example/", Page::Status(500))
            .page("https://beta.example/p/2222", Page::Html("B")),
    );

    let config = test_config(&["alpha.example", "beta.example"]);
    let report = run(&config, site.clone()).await.unwrap();

    assert_eq!(products(&report, "alpha.example"), vec!["https://alpha.example/p/1111"]);
    // Beta's seed failed; alpha's cross-domain link is never followed
    assert!(products(&report, "beta.example").is_empty());
    assert_eq!(site.calls_to("https://beta.example/p/2222"), 0);

    // One attempt plus two retries
    assert_eq!(site.calls_to("https://beta.example/"), 3);

    let alpha = &report.domains["alpha.example"];
    assert_eq!(alpha.successful_requests, 2);
    assert_eq!(alpha.failed_requests, 0);

    let beta = &report.domains["beta.example"];
    assert_eq!(beta.successful_requests, 0);
    assert_eq!(beta.failed_requests, 1);

    assert_eq!(report.totals.successful_requests, 2);
    assert_eq!(report.totals.failed_requests, 1);
    assert_eq!(report.totals.total_requests, 3);
}

#[tokio::test]
async fn test_also_allow_follows_partner_domain() {
    let site = Arc::new(
        SiteMap::default()
            .page(
                "https://shop.example/",
                Page::Html(r#"<a href="https://cdn-shop.example/p/3333">Partner</a>"#),
            )
            .page("https://cdn-shop.example/p/3333", Page::Html("P")),
    );

    let mut config = test_config(&["shop.example"]);
    config.domains[0].also_allow = vec!["cdn-shop.example".to_string()];
    let report = run(&config, site.clone()).await.unwrap();

    assert_eq!(
        products(&report, "shop.example"),
        vec!["https://cdn-shop.example/p/3333"]
    );
    assert_eq!(site.calls_to("https://cdn-shop.example/p/3333"), 1);
}

#[tokio::test]
async fn test_timeout_keeps_partial_results() {
    let site = Arc::new(
        SiteMap::default()
            .page(
                "https://slow.example/",
                Page::Html(r#"<a href="/p/1111">A</a><a href="/category/stuck">Stuck</a>"#),
            )
            .page("https://slow.example/p/1111", Page::Html("A"))
            .page(
                "https://slow.example/category/stuck",
                Page::Slow(Duration::from_secs(30), r#"<a href="/p/9999">Late</a>"#),
            )
            .page(
                "https://fast.example/",
                Page::Html(r#"<a href="/p/2222">B</a>"#),
            )
            .page("https://fast.example/p/2222", Page::Html("B")),
    );

    let mut config = test_config(&["slow.example", "fast.example"]);
    config.crawler.domain_timeout_secs = 1;

    let started = std::time::Instant::now();
    let report = run(&config, site.clone()).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));

    assert!(report.timed_out.contains("slow.example"));
    assert!(!report.timed_out.contains("fast.example"));

    assert_eq!(products(&report, "slow.example"), vec!["https://slow.example/p/1111"]);
    assert_eq!(products(&report, "fast.example"), vec!["https://fast.example/p/2222"]);

    // The aborted fetch is neither a success nor a failure
    let slow = &report.domains["slow.example"];
    assert_eq!(slow.successful_requests, 2);
    assert_eq!(slow.failed_requests, 0);
}

#[tokio::test]
async fn test_each_url_fetched_at_most_once() {
    let site = Arc::new(
        SiteMap::default()
            .page(
                "https://loop.example/",
                Page::Html(
                    r#"<a href="/category/a">A</a><a href="/category/b">B</a>
                       <a href="/category/a#top">A again</a>"#,
                ),
            )
            .page(
                "https://loop.example/category/a",
                Page::Html(
                    r#"<a href="/">Home</a><a href="/category/b">B</a>
                       <a href="/p/1234">P</a><a href="/p/1234/">P slash</a>"#,
                ),
            )
            .page(
                "https://loop.example/category/b",
                Page::Html(
                    r#"<a href="/category/a">A</a><a href="/p/1234?utm_source=b">P</a>"#,
                ),
            )
            .page(
                "https://loop.example/p/1234",
                Page::Html(r#"<a href="/category/b">B</a>"#),
            ),
    );

    let mut config = test_config(&["loop.example"]);
    config.crawler.respect_robots = false;
    let report = run(&config, site.clone()).await.unwrap();

    for url in [
        "https://loop.example/",
        "https://loop.example/category/a",
        "https://loop.example/category/b",
        "https://loop.example/p/1234",
    ] {
        assert_eq!(site.calls_to(url), 1, "{} fetched more than once", url);
    }
    assert_eq!(site.total_calls(), 4);
    assert_eq!(products(&report, "loop.example"), vec!["https://loop.example/p/1234"]);
}

#[tokio::test]
async fn test_robots_fetched_once_per_origin() {
    let site = Arc::new(
        SiteMap::default()
            .page(
                "https://polite.example/robots.txt",
                Page::Html("User-agent: *\nDisallow: /private/\n"),
            )
            .page(
                "https://polite.example/",
                Page::Html(
                    r#"<a href="/p/1001">1</a><a href="/p/1002">2</a>
                       <a href="/private/category/x">x</a>"#,
                ),
            )
            .page("https://polite.example/p/1001", Page::Html("1"))
            .page("https://polite.example/p/1002", Page::Html("2")),
    );

    let config = test_config(&["polite.example"]);
    let report = run(&config, site.clone()).await.unwrap();

    assert_eq!(site.calls_to("https://polite.example/robots.txt"), 1);
    assert_eq!(site.calls_to("https://polite.example/private/category/x"), 0);
    assert_eq!(report.domains["polite.example"].successful_requests, 3);
}

#[tokio::test]
async fn test_invalid_config_fails_before_fetching() {
    let site = Arc::new(SiteMap::default());

    let mut config = test_config(&["shop.example"]);
    config.crawler.concurrent_requests = 0;

    let result = run(&config, site.clone()).await;
    assert!(matches!(result, Err(ScoutError::Config(_))));
    assert_eq!(site.total_calls(), 0);
}

#[tokio::test]
async fn test_seed_out_of_scope_rejected() {
    let site = Arc::new(SiteMap::default());

    let mut config = test_config(&["shop.example"]);
    config.domains[0].seeds = vec!["https://elsewhere.example/".to_string()];

    assert!(matches!(
        run(&config, site.clone()).await,
        Err(ScoutError::Config(_))
    ));
    assert_eq!(site.total_calls(), 0);
}

#[tokio::test]
async fn test_concurrent_fetches_bounded_per_domain() {
    let ids: Vec<u32> = (1001..1013).collect();
    let links: String = ids
        .iter()
        .map(|id| format!(r#"<a href="/p/{}">{}</a>"#, id, id))
        .collect();

    let mut site = SiteMap::default().page(
        "https://busy.example/",
        Page::Html(Box::leak(links.into_boxed_str())),
    );
    for id in &ids {
        site = site.page(
            &format!("https://busy.example/p/{}", id),
            Page::Slow(Duration::from_millis(100), "P"),
        );
    }
    let site = Arc::new(site);

    let mut config = test_config(&["busy.example"]);
    config.crawler.concurrent_requests = 3;
    config.crawler.respect_robots = false;
    let report = run(&config, site.clone()).await.unwrap();

    assert_eq!(report.domains["busy.example"].successful_requests, 13);
    assert_eq!(products(&report, "busy.example").len(), 12);
    // Twelve slow pages keep every permit busy, but never more
    assert_eq!(site.peak_in_flight(), 3);
}
