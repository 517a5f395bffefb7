//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use frontier_crawl::config::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use frontier_crawl::crawler::{crawl, Coordinator};
use frontier_crawl::CrawlError;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration crawling `start_url` into `storage_path`
fn create_test_config(start_url: &str, storage_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            start_url: Some(start_url.to_string()),
            workers: 2,
            max_retries: 3,
            backoff_ms: 10,
            default_crawl_delay_ms: 5, // Very short for testing
            politeness_jitter_ms: 0,
            max_rate_limit_retries: None,
            request_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: Some("https://example.com/contact".to_string()),
            contact_email: Some("test@example.com".to_string()),
        },
        output: OutputConfig {
            storage_path: storage_path.to_string_lossy().into_owned(),
        },
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_get(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, content: &str) {
    mount_get(
        server,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_string(content),
    )
    .await;
}

async fn run(config: Config) -> frontier_crawl::output::CrawlStatistics {
    tokio::time::timeout(Duration::from_secs(30), crawl(config))
        .await
        .expect("crawl did not finish")
        .expect("crawl failed")
}

fn read_json(path: &Path) -> Value {
    let content = std::fs::read_to_string(path).expect("output file missing");
    serde_json::from_str(&content).expect("output is not JSON")
}

/// Mounts a small site:
///
/// ```text
/// /        -> /page1, /page2, /private, external
/// /page1   -> /, /missing
/// /page2   -> 301 /page3
/// /page3   -> (no links)
/// /missing -> 404
/// /private -> disallowed by robots.txt
/// ```
async fn mount_site(server: &MockServer) {
    let base = server.uri();

    mount_robots(server, "User-agent: *\nDisallow: /private\n").await;
    mount_get(
        server,
        "/",
        html(&format!(
            r#"<a href="/page1">One</a>
               <a href="{}/page2">Two</a>
               <a href="/private">Private</a>
               <a href="https://elsewhere.org/">Elsewhere</a>"#,
            base
        )),
    )
    .await;
    mount_get(
        server,
        "/page1",
        html(r#"<a href="/">Home</a><a href="/missing#top">Gone</a>"#),
    )
    .await;
    mount_get(
        server,
        "/page2",
        ResponseTemplate::new(301).insert_header("location", "/page3"),
    )
    .await;
    mount_get(server, "/page3", html("<p>The end</p>")).await;
    mount_get(server, "/missing", ResponseTemplate::new(404)).await;

    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(html("<p>secret</p>"))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_writes_json() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let base = server.uri();

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("storage.json");

    let stats = run(create_test_config(&format!("{}/", base), &output)).await;

    let expected = json!({
        format!("{}/", base): {"links": [
            format!("{}/page1", base),
            format!("{}/page2", base),
            format!("{}/private", base),
        ]},
        format!("{}/page1", base): {"links": [
            format!("{}/", base),
            format!("{}/missing", base),
        ]},
        format!("{}/page2", base): null,
        format!("{}/page3", base): {"links": []},
        format!("{}/missing", base): null,
    });
    assert_eq!(read_json(&output), expected);

    assert_eq!(stats.policy_denied, 1);
    assert_eq!(stats.redirected, 1);
    assert_eq!(stats.not_found, 1);
}

#[tokio::test]
async fn test_full_crawl_writes_sqlite() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let base = server.uri();

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("crawl.db");

    run(create_test_config(&format!("{}/", base), &output)).await;

    let conn = rusqlite::Connection::open(&output).unwrap();
    let mut stmt = conn
        .prepare("SELECT url, links FROM pages ORDER BY url")
        .unwrap();
    let rows: Vec<(String, Option<String>)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let urls: Vec<&str> = rows.iter().map(|(url, _)| url.as_str()).collect();
    assert_eq!(urls.len(), 5);
    assert!(!urls.contains(&format!("{}/private", base).as_str()));

    let page2 = rows
        .iter()
        .find(|(url, _)| *url == format!("{}/page2", base))
        .unwrap();
    assert_eq!(page2.1, None);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /\n").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, "/", html("<p>back up</p>")).await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("storage.json");

    let stats = run(create_test_config(&format!("{}/", server.uri()), &output)).await;

    assert_eq!(
        read_json(&output),
        json!({ format!("{}/", server.uri()): {"links": []} })
    );
    assert_eq!(stats.retried, 1);
    assert_eq!(stats.fetched, 2);
}

#[tokio::test]
async fn test_persistent_failure_is_dropped() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /\n").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("storage.json");

    let stats = run(create_test_config(&format!("{}/", server.uri()), &output)).await;

    assert_eq!(read_json(&output), json!({}));
    assert_eq!(stats.dropped, 1);
}

#[tokio::test]
async fn test_rate_limited_page_is_retried_after_backoff() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /\n").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_get(&server, "/", html("<p>ok</p>")).await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("storage.json");
    let mut config = create_test_config(&format!("{}/", server.uri()), &output);
    // A single transient attempt does not cap rate-limit retries
    config.crawler.max_retries = 1;

    let stats = run(config).await;

    assert_eq!(stats.rate_limited, 2);
    assert!(read_json(&output)
        .get(format!("{}/", server.uri()))
        .is_some());
}

#[tokio::test]
async fn test_forbidden_robots_txt_disallows_everything() {
    let server = MockServer::start().await;
    mount_get(&server, "/robots.txt", ResponseTemplate::new(403)).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>never</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("storage.json");

    let stats = run(create_test_config(&format!("{}/", server.uri()), &output)).await;

    assert_eq!(stats.policy_denied, 1);
    assert_eq!(read_json(&output), json!({}));
}

#[tokio::test]
async fn test_invalid_start_url_aborts_before_crawling() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("storage.json");

    let result = crawl(create_test_config("mailto:someone@example.com", &output)).await;

    assert!(matches!(result, Err(CrawlError::InvalidStartUrl { .. })));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_coordinator_normalizes_start_url() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /\n").await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("storage.json");
    let start = format!("{}/?utm_source=feed#intro", server.uri());

    let coordinator = Coordinator::new(create_test_config(&start, &output))
        .await
        .unwrap();

    assert_eq!(coordinator.start_url().as_str(), format!("{}/", server.uri()));
}
