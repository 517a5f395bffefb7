//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Classifying responses into documents or [`FetchError`]s
//!
//! Redirects are never followed here. They come back as
//! [`FetchError::Redirect`] so the scheduler can record the source URL and
//! queue the target as a separate item.

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A fetched page body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The URL the body was fetched from
    pub url: Url,
    pub body: String,
}

/// A classified fetch failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("page not found")]
    NotFound,

    #[error("rate limited")]
    RateLimited,

    #[error("HTTP {status} redirect")]
    Redirect {
        status: u16,
        /// The resolved `Location`, if the response carried a usable one
        target: Option<Url>,
    },

    #[error("HTTP {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Retrieves documents for the scheduler
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Document))` - A document worth parsing
    /// * `Ok(None)` - The request succeeded but there was no content to parse
    /// * `Err(FetchError)` - The request failed; see [`FetchError`]
    async fn fetch(&self, url: &Url) -> Result<Option<Document>, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Whole-request timeout
///
/// # Example
///
/// ```no_run
/// use frontier_crawl::config::UserAgentConfig;
/// use frontier_crawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(5)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::none()) // Redirects are classified, not followed
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetcher`] over a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// # Response handling
    ///
    /// | Response | Result |
    /// |----------|--------|
    /// | 2xx HTML with a body | `Ok(Some(document))` |
    /// | 2xx empty or not HTML | `Ok(None)` |
    /// | 3xx | `Redirect` with `Location` resolved against `url` |
    /// | 404 | `NotFound` |
    /// | 429 | `RateLimited` |
    /// | Other status | `Status` |
    /// | Connect, timeout, body errors | `Transport` |
    async fn fetch(&self, url: &Url) -> Result<Option<Document>, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport(describe_transport_error(&e)))?;

        let status = response.status();
        tracing::debug!(url = %url, status = status.as_u16(), "Fetched");

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if status.is_redirection() {
            return Err(FetchError::Redirect {
                status: status.as_u16(),
                target: redirect_target(url, &response),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if !is_html(&response) {
            tracing::debug!(url = %url, "Response is not HTML");
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(describe_transport_error(&e)))?;

        if body.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(Document {
            url: url.clone(),
            body,
        }))
    }
}

/// Resolves the `Location` header of a redirect response against the request URL
fn redirect_target(request_url: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    request_url.join(location.trim()).ok()
}

/// A response without a Content-Type is given the benefit of the doubt
fn is_html(response: &Response) -> bool {
    match response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        Some(content_type) => {
            let content_type = content_type.to_ascii_lowercase();
            content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
        }
        None => true,
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: Some("https://example.com/about".to_string()),
            contact_email: Some("admin@example.com".to_string()),
        }
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(build_http_client(&create_test_config(), Duration::from_secs(5)).unwrap())
    }

    async fn serve(route: &str, response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    fn url_on(server: &MockServer, route: &str) -> Url {
        Url::parse(&server.uri()).unwrap().join(route).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config(), Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_html_document() {
        let server = serve(
            "/page",
            ResponseTemplate::new(200)
                .set_body_raw("<a href=\"/next\">next</a>", "text/html; charset=utf-8"),
        )
        .await;

        let url = url_on(&server, "/page");
        let document = fetcher().fetch(&url).await.unwrap().unwrap();
        assert_eq!(document.url, url);
        assert!(document.body.contains("/next"));
    }

    #[tokio::test]
    async fn test_sends_configured_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(wiremock::matchers::header(
                "user-agent",
                "TestCrawler/1.0 (+https://example.com/about; admin@example.com)",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<p>hi</p>", "text/html"))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetcher().fetch(&url_on(&server, "/")).await;
        assert!(matches!(result, Ok(Some(_))));
    }

    #[tokio::test]
    async fn test_empty_body_is_no_content() {
        let server = serve(
            "/empty",
            ResponseTemplate::new(200).insert_header("content-type", "text/html"),
        )
        .await;

        assert_eq!(fetcher().fetch(&url_on(&server, "/empty")).await, Ok(None));
    }

    #[tokio::test]
    async fn test_non_html_is_no_content() {
        let server = serve(
            "/data.json",
            ResponseTemplate::new(200).set_body_raw("{\"a\": 1}", "application/json"),
        )
        .await;

        assert_eq!(fetcher().fetch(&url_on(&server, "/data.json")).await, Ok(None));
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = serve("/gone", ResponseTemplate::new(404)).await;
        assert_eq!(
            fetcher().fetch(&url_on(&server, "/gone")).await,
            Err(FetchError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = serve("/busy", ResponseTemplate::new(429)).await;
        assert_eq!(
            fetcher().fetch(&url_on(&server, "/busy")).await,
            Err(FetchError::RateLimited)
        );
    }

    #[tokio::test]
    async fn test_redirect_is_not_followed() {
        let server = serve(
            "/old",
            ResponseTemplate::new(301).insert_header("location", "/new"),
        )
        .await;

        assert_eq!(
            fetcher().fetch(&url_on(&server, "/old")).await,
            Err(FetchError::Redirect {
                status: 301,
                target: Some(url_on(&server, "/new")),
            })
        );
    }

    #[tokio::test]
    async fn test_redirect_without_location() {
        let server = serve("/nowhere", ResponseTemplate::new(302)).await;
        assert_eq!(
            fetcher().fetch(&url_on(&server, "/nowhere")).await,
            Err(FetchError::Redirect {
                status: 302,
                target: None,
            })
        );
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let server = serve("/broken", ResponseTemplate::new(503)).await;
        assert_eq!(
            fetcher().fetch(&url_on(&server, "/broken")).await,
            Err(FetchError::Status(503))
        );
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        // Nothing listens once the listener is dropped
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = Url::parse(&format!("http://{}/", listener.local_addr().unwrap())).unwrap();
        drop(listener);

        assert!(matches!(
            fetcher().fetch(&url).await,
            Err(FetchError::Transport(_))
        ));
    }
}
