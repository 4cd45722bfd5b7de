//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end over real HTTP.

use product_scout::config::{Config, CrawlerConfig, DomainEntry, UserAgentConfig};
use product_scout::crawler::crawl;
use product_scout::output::write_results;
use product_scout::CrawlResult;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the mock server
fn create_test_config(server: &MockServer, max_depth: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth,
            concurrent_requests: 4,
            delay_range: (0.0, 0.0),
            domain_timeout_secs: 30,
            request_timeout_secs: 5,
            max_retries: 3,
            retry_base_delay_ms: 1,
            retry_max_delay_ms: 10,
            respect_robots: true,
            use_js_rendering: false,
        },
        user_agent: UserAgentConfig {
            rotate: false,
            default: "TestBot/1.0".to_string(),
            robots_token: "TestBot".to_string(),
        },
        domains: vec![DomainEntry {
            domain: "127.0.0.1".to_string(),
            seeds: vec![format!("{}/", server.uri())],
            also_allow: vec![],
        }],
        ..Config::default()
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn products(results: &CrawlResult) -> Vec<String> {
    results
        .get("127.0.0.1")
        .map(|urls| urls.iter().cloned().collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_full_crawl_collects_products() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/category/shoes">Shoes</a>
           <a href="/about-us">About</a>
           <a href="https://elsewhere.example/p/9999">Partner</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/category/shoes",
        r#"<a href="/p/1001">Runner</a>
           <a href="/p/1002?utm_source=listing">Trail</a>
           <a href="/cart">Cart</a>"#,
    )
    .await;
    mount_page(&server, "/p/1001", "Runner").await;
    mount_page(&server, "/p/1002", "Trail").await;

    Mock::given(method("GET"))
        .and(path("/about-us"))
        .respond_with(html("About"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(html("Cart"))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server, 3);
    let report = crawl(&config).await.expect("crawl failed");

    assert_eq!(
        products(&report.results),
        vec![
            format!("{}/p/1001", server.uri()),
            format!("{}/p/1002", server.uri()),
        ]
    );
    assert_eq!(report.totals.successful_requests, 4);
    assert_eq!(report.totals.failed_requests, 0);
    assert!(report.timed_out.is_empty());

    let summary = &report.domains["127.0.0.1"];
    assert_eq!(summary.total_requests, 4);
    assert_eq!(summary.success_rate, 1.0);
}

#[tokio::test]
async fn test_robots_disallow_is_respected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /admin/\n"),
        )
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        r#"<a href="/admin/category/x">Admin</a><a href="/p/1001">Product</a>"#,
    )
    .await;
    mount_page(&server, "/p/1001", "Product").await;
    Mock::given(method("GET"))
        .and(path("/admin/category/x"))
        .respond_with(html("secret"))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server, 2);
    let report = crawl(&config).await.expect("crawl failed");

    // Denied targets count as neither success nor failure
    assert_eq!(report.totals.successful_requests, 2);
    assert_eq!(report.totals.failed_requests, 0);
    assert_eq!(
        products(&report.results),
        vec![format!("{}/p/1001", server.uri())]
    );
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/p/123">Flaky</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/p/123"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .with_priority(1)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/123"))
        .respond_with(html("Finally"))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, 2);
    let report = crawl(&config).await.expect("crawl failed");

    assert_eq!(report.totals.successful_requests, 2);
    assert_eq!(report.totals.failed_requests, 0);
}

#[tokio::test]
async fn test_permanent_errors_are_not_retried() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/p/404404">Gone</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/p/404404"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, 2);
    let report = crawl(&config).await.expect("crawl failed");

    assert_eq!(report.totals.successful_requests, 1);
    assert_eq!(report.totals.failed_requests, 1);
}

#[tokio::test]
async fn test_depth_limit() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/category/a">Level 1</a>"#).await;
    mount_page(&server, "/category/a", r#"<a href="/p/2222">Level 2</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/p/2222"))
        .respond_with(html("too deep"))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server, 1);
    let report = crawl(&config).await.expect("crawl failed");

    assert_eq!(report.totals.successful_requests, 2);
    assert!(products(&report.results).is_empty());
}

#[tokio::test]
async fn test_unparseable_page_does_not_stop_crawl() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/category/broken">Broken</a><a href="/p/1001">Fine</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/category/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>\0\0\0</html>", "text/html"))
        .mount(&server)
        .await;
    mount_page(&server, "/p/1001", "Fine").await;

    let config = create_test_config(&server, 2);
    let report = crawl(&config).await.expect("crawl failed");

    assert_eq!(report.totals.successful_requests, 3);
    assert_eq!(report.totals.failed_requests, 0);
    assert_eq!(
        products(&report.results),
        vec![format!("{}/p/1001", server.uri())]
    );
}

#[tokio::test]
async fn test_session_cookies_are_carried_forward() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            html(r#"<a href="/p/1001">Product</a>"#)
                .insert_header("set-cookie", "sid=abc123; Path=/; HttpOnly"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/1001"))
        .and(header("cookie", "sid=abc123"))
        .respond_with(html("Product"))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, 2);
    let report = crawl(&config).await.expect("crawl failed");

    assert_eq!(report.totals.successful_requests, 2);
    assert_eq!(report.totals.failed_requests, 0);
}

#[tokio::test]
async fn test_results_file_written() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/products/blue-mug">Mug</a>"#).await;
    mount_page(&server, "/products/blue-mug", "Mug").await;

    let config = create_test_config(&server, 2);
    let report = crawl(&config).await.expect("crawl failed");

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("product_urls.json");
    write_results(&report.results, &path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        json["127.0.0.1"],
        serde_json::json!([format!("{}/products/blue-mug", server.uri())])
    );
}

#[tokio::test]
async fn test_domain_with_no_products_still_reported() {
    let server = MockServer::start().await;

    mount_page(&server, "/", "Nothing to see").await;

    let config = create_test_config(&server, 2);
    let report = crawl(&config).await.expect("crawl failed");

    assert_eq!(report.results.domain_count(), 1);
    assert!(report.results.get("127.0.0.1").unwrap().is_empty());
}
