//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up mock HTTP servers and exercise the
//! full crawl cycle end-to-end: traversal, depth bounds, trap filtering,
//! retry/backoff, body decoding, renderer delegation, and domain timeouts.

use shopcrawl::config::{Config, CrawlerConfig, OutputConfig, RetryConfig};
use shopcrawl::crawler::{build_http_client, Fetcher, HeaderFactory, RetryPolicy};
use shopcrawl::patterns::PatternRegistry;
use shopcrawl::render::{RenderError, Renderer};
use shopcrawl::stats::StatsCollector;
use shopcrawl::Orchestrator;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration crawling the given domain
fn test_config(domain: &str) -> Config {
    Config {
        domains: vec![domain.to_string()],
        crawler: CrawlerConfig {
            max_depth: 2,
            concurrency_limit: 5,
            delay_range_ms: [0, 0], // no politeness delay in tests
            domain_timeout_secs: 30,
            rotate_user_agents: true,
            use_rendering: false,
        },
        retry: RetryConfig {
            max_attempts: 3,
            start_delay_ms: 10,
            max_delay_ms: 40,
            backoff_factor: 2.0,
            retryable_statuses: vec![500, 502, 503, 504],
        },
        output: OutputConfig::default(),
        headers: Default::default(),
        user_agents: vec![],
    }
}

/// Builds a small HTML page linking to the given hrefs
fn page(hrefs: &[&str]) -> String {
    let links: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!("<html><head><title>Page</title></head><body>{}</body></html>", links)
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, at: &str, hrefs: &[&str]) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(html_response(page(hrefs)))
        .mount(server)
        .await;
}

async fn mount_never(server: &MockServer, at: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(html_response(page(&[])))
        .expect(0)
        .mount(server)
        .await;
}

fn gzip_bytes(input: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(input).unwrap();
    encoder.finish().unwrap()
}

fn brotli_bytes(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut writer = brotli::CompressorWriter::new(&mut out, 4096, 5, 22);
        writer.write_all(input).unwrap();
    }
    out
}

#[tokio::test]
async fn test_full_crawl_discovers_product_urls() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/product/1", "/login", "/about"]).await;
    mount_page(&server, "/product/1", &[]).await;
    mount_never(&server, "/login").await;
    mount_never(&server, "/about").await; // unclassified, never followed

    let orchestrator = Orchestrator::new(test_config(&base)).unwrap();
    let results = orchestrator.discover().await.unwrap();

    let products = results.get(&base).expect("domain missing from results");
    assert_eq!(products, &vec![format!("{}/product/1", base)]);

    let stats = orchestrator.stats().snapshot();
    assert_eq!(stats.requests, 2); // root + product page
    assert_eq!(stats.successes, 2);
    assert_eq!(stats.failures, 0);
}

#[tokio::test]
async fn test_depth_limit_stops_recursion() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/product/1"]).await;
    mount_page(&server, "/product/1", &["/product/2"]).await;
    mount_never(&server, "/product/2").await; // depth 2 > max_depth 1

    let mut config = test_config(&base);
    config.crawler.max_depth = 1;

    let orchestrator = Orchestrator::new(config).unwrap();
    let results = orchestrator.discover().await.unwrap();

    // /product/2 is classified by URL shape only after a fetch; since it is
    // never dispatched, only /product/1 is reported.
    assert_eq!(
        results.get(&base).unwrap(),
        &vec![format!("{}/product/1", base)]
    );
}

#[tokio::test]
async fn test_trap_paths_never_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        &["/cart?id=1", "/checkout", "/signin", "/wishlist", "/product/5"],
    )
    .await;
    mount_page(&server, "/product/5", &[]).await;
    mount_never(&server, "/cart").await;
    mount_never(&server, "/checkout").await;
    mount_never(&server, "/signin").await;
    mount_never(&server, "/wishlist").await;

    let orchestrator = Orchestrator::new(test_config(&base)).unwrap();
    let results = orchestrator.discover().await.unwrap();

    assert_eq!(
        results.get(&base).unwrap(),
        &vec![format!("{}/product/5", base)]
    );
}

#[tokio::test]
async fn test_retry_bound_on_persistent_503() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Every attempt fails; exactly max_attempts network calls, then the
    // branch is abandoned.
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(test_config(&base)).unwrap();
    let results = orchestrator.discover().await.unwrap();

    assert!(results.get(&base).unwrap().is_empty());

    let stats = orchestrator.stats().snapshot();
    assert_eq!(stats.requests, 3);
    assert_eq!(stats.successes, 0);
    assert_eq!(stats.failures, 1); // one logical fetch failed
}

#[tokio::test]
async fn test_transient_503_recovers() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "/", &["/product/1"]).await;
    mount_page(&server, "/product/1", &[]).await;

    let orchestrator = Orchestrator::new(test_config(&base)).unwrap();
    let results = orchestrator.discover().await.unwrap();

    assert_eq!(
        results.get(&base).unwrap(),
        &vec![format!("{}/product/1", base)]
    );

    let stats = orchestrator.stats().snapshot();
    assert_eq!(stats.requests, 4); // 2 failed attempts + root + product page
    assert_eq!(stats.successes, 2);
    assert_eq!(stats.failures, 0);
}

#[tokio::test]
async fn test_non_retryable_status_fails_immediately() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(test_config(&base)).unwrap();
    let results = orchestrator.discover().await.unwrap();

    assert!(results.get(&base).unwrap().is_empty());

    let stats = orchestrator.stats().snapshot();
    assert_eq!(stats.requests, 1);
    assert_eq!(stats.failures, 1);
}

#[tokio::test]
async fn test_compressed_bodies_decode() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Root is gzip-compressed, the product page is brotli-compressed; both
    // must decode and the crawl must follow the link between them.
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(gzip_bytes(page(&["/product/77"]).as_bytes()))
                .insert_header("content-type", "text/html")
                .insert_header("content-encoding", "gzip"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/77"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(brotli_bytes(page(&[]).as_bytes()))
                .insert_header("content-type", "text/html")
                .insert_header("content-encoding", "br"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(test_config(&base)).unwrap();
    let results = orchestrator.discover().await.unwrap();

    assert_eq!(
        results.get(&base).unwrap(),
        &vec![format!("{}/product/77", base)]
    );
}

#[tokio::test]
async fn test_unknown_content_encoding_passes_through() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page(&["/product/3"]))
                .insert_header("content-type", "text/html")
                .insert_header("content-encoding", "zstd"),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/product/3", &[]).await;

    let orchestrator = Orchestrator::new(test_config(&base)).unwrap();
    let results = orchestrator.discover().await.unwrap();

    assert_eq!(
        results.get(&base).unwrap(),
        &vec![format!("{}/product/3", base)]
    );
}

#[tokio::test]
async fn test_pagination_links_followed_but_not_reported() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/catalog?page=2"]).await;
    Mock::given(method("GET"))
        .and(path("/catalog"))
        .respond_with(html_response(page(&["/product/88"])))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/product/88", &[]).await;

    let orchestrator = Orchestrator::new(test_config(&base)).unwrap();
    let results = orchestrator.discover().await.unwrap();

    // The pagination page is crawled, and only the product page is reported
    assert_eq!(
        results.get(&base).unwrap(),
        &vec![format!("{}/product/88", base)]
    );
}

#[tokio::test]
async fn test_cycles_and_duplicates_fetch_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Root links to the product page twice; the product page links back to
    // root. Every page is fetched exactly once.
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(page(&["/product/1", "/product/1"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/1"))
        .respond_with(html_response(page(&["/"])))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(test_config(&base)).unwrap();
    let results = orchestrator.discover().await.unwrap();

    assert_eq!(
        results.get(&base).unwrap(),
        &vec![format!("{}/product/1", base)]
    );

    let stats = orchestrator.stats().snapshot();
    assert_eq!(stats.requests, 2);
}

#[tokio::test]
async fn test_failed_branch_does_not_abort_siblings() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", &["/product/1", "/product/2"]).await;
    Mock::given(method("GET"))
        .and(path("/product/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "/product/2", &[]).await;

    let orchestrator = Orchestrator::new(test_config(&base)).unwrap();
    let results = orchestrator.discover().await.unwrap();

    // Both URLs classify as products; the failed branch still reports its
    // URL and its sibling is crawled normally.
    assert_eq!(
        results.get(&base).unwrap(),
        &vec![
            format!("{}/product/1", base),
            format!("{}/product/2", base)
        ]
    );
}

#[tokio::test]
async fn test_domain_timeout_returns_quickly_with_empty_results() {
    let server = MockServer::start().await;
    let base = server.uri();

    // The only page hangs longer than the domain deadline
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(page(&[])).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let mut config = test_config(&base);
    config.crawler.domain_timeout_secs = 1;

    let orchestrator = Orchestrator::new(config).unwrap();
    let started = Instant::now();
    let results = orchestrator.discover().await.unwrap();

    assert!(
        started.elapsed() < Duration::from_secs(5),
        "discover must not wait out the hanging response"
    );
    assert_eq!(results.get(&base).unwrap(), &Vec::<String>::new());
}

#[tokio::test]
async fn test_timed_out_domain_keeps_partial_results() {
    let server = MockServer::start().await;
    let base = server.uri();

    // A chain keeps ordering deterministic: /product/1 completes, then
    // /product/2 hangs past the deadline.
    mount_page(&server, "/", &["/product/1"]).await;
    mount_page(&server, "/product/1", &["/product/2"]).await;
    Mock::given(method("GET"))
        .and(path("/product/2"))
        .respond_with(html_response(page(&[])).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let mut config = test_config(&base);
    config.crawler.domain_timeout_secs = 2;

    let orchestrator = Orchestrator::new(config).unwrap();
    let results = orchestrator.discover().await.unwrap();

    assert_eq!(
        results.get(&base).unwrap(),
        &vec![format!("{}/product/1", base)],
        "partial results must survive the timeout"
    );
}

#[tokio::test]
async fn test_multiple_domains_crawl_independently() {
    let server_a = MockServer::start().await;
    let server_b = MockServer::start().await;

    mount_page(&server_a, "/", &["/product/1"]).await;
    mount_page(&server_a, "/product/1", &[]).await;
    // Domain B is entirely broken
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server_b)
        .await;

    let mut config = test_config(&server_a.uri());
    config.domains.push(server_b.uri());

    let orchestrator = Orchestrator::new(config).unwrap();
    let results = orchestrator.discover().await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(
        results.get(&server_a.uri()).unwrap(),
        &vec![format!("{}/product/1", server_a.uri())]
    );
    assert!(results.get(&server_b.uri()).unwrap().is_empty());
}

/// Renderer stub returning canned HTML
struct StubRenderer {
    html: String,
}

#[async_trait::async_trait]
impl Renderer for StubRenderer {
    async fn render(&self, _url: &str) -> Result<String, RenderError> {
        Ok(self.html.clone())
    }
}

fn test_fetcher(config: &Config, renderer: Option<Arc<dyn Renderer>>) -> (Fetcher, Arc<StatsCollector>) {
    let stats = Arc::new(StatsCollector::new());
    let fetcher = Fetcher::new(
        build_http_client(config.crawler.concurrency_limit).unwrap(),
        Arc::new(HeaderFactory::new(config)),
        RetryPolicy::from_config(&config.retry),
        Arc::new(PatternRegistry::builtin().unwrap()),
        renderer,
        Arc::clone(&stats),
    );
    (fetcher, stats)
}

#[tokio::test]
async fn test_renderer_used_for_rendering_required_domain() {
    let config = test_config("www.zara.com");
    let rendered = page(&["/jacket-p12345.html"]);
    let (fetcher, stats) = test_fetcher(
        &config,
        Some(Arc::new(StubRenderer {
            html: rendered.clone(),
        })),
    );

    // zara is registered as rendering-required; no HTTP request is made
    let body = fetcher
        .fetch("https://www.zara.com/", "www.zara.com")
        .await
        .unwrap();

    assert_eq!(body, rendered);
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.requests, 1);
    assert_eq!(snapshot.successes, 1);
}

#[tokio::test]
async fn test_empty_render_falls_back_to_http() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/product/1"]).await;

    let config = test_config("www.zara.com");
    let (fetcher, stats) = test_fetcher(
        &config,
        Some(Arc::new(StubRenderer {
            html: String::new(),
        })),
    );

    // The renderer produced nothing, so the fetch falls through to HTTP
    // against the mock server.
    let body = fetcher
        .fetch(&format!("{}/", server.uri()), "www.zara.com")
        .await
        .unwrap();

    assert!(body.contains("/product/1"));
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.requests, 2); // render attempt + HTTP GET
    assert_eq!(snapshot.successes, 1);
}

#[tokio::test]
async fn test_renderer_not_consulted_for_plain_domains() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &[]).await;

    let config = test_config(&server.uri());
    let (fetcher, stats) = test_fetcher(
        &config,
        Some(Arc::new(StubRenderer {
            html: "<html>rendered</html>".to_string(),
        })),
    );

    let host = server.uri().replace("http://", "");
    let body = fetcher.fetch(&format!("{}/", server.uri()), &host).await.unwrap();

    assert!(body.contains("<title>Page</title>"));
    assert_eq!(stats.snapshot().requests, 1);
}
