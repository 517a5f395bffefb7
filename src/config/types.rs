use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Frontier-Crawl
///
/// Every section falls back to its defaults, so an empty file (or no file at
/// all) yields a usable configuration once a start URL is supplied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// URL the crawl is seeded with; also defines the crawl scope
    #[serde(rename = "start-url")]
    pub start_url: Option<String>,

    /// Number of concurrent workers draining the frontier
    pub workers: u32,

    /// Attempt cap for transient failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base rate-limit backoff (milliseconds)
    #[serde(rename = "backoff-ms")]
    pub backoff_ms: u64,

    /// Politeness delay used when robots.txt has no Crawl-delay (milliseconds)
    #[serde(rename = "default-crawl-delay-ms")]
    pub default_crawl_delay_ms: u64,

    /// Upper bound of the random jitter added to every politeness sleep (milliseconds)
    #[serde(rename = "politeness-jitter-ms")]
    pub politeness_jitter_ms: u64,

    /// Optional attempt cap for rate-limited URLs; unbounded when absent
    #[serde(rename = "max-rate-limit-retries")]
    pub max_rate_limit_retries: Option<u32>,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: None,
            workers: 1,
            max_retries: 3,
            backoff_ms: 5_000,
            default_crawl_delay_ms: 1_000,
            politeness_jitter_ms: 1_000,
            max_rate_limit_retries: None,
            request_timeout_secs: 5,
        }
    }
}

impl CrawlerConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn default_crawl_delay(&self) -> Duration {
        Duration::from_millis(self.default_crawl_delay_ms)
    }

    pub fn politeness_jitter(&self) -> Duration {
        Duration::from_millis(self.politeness_jitter_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the product token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "FrontierCrawl".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the full User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`, with the
    /// parenthesised part reduced to whatever contact details are configured.
    pub fn header_value(&self) -> String {
        let contact: Vec<String> = [
            self.contact_url.as_ref().map(|u| format!("+{}", u)),
            self.contact_email.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where crawl results are flushed; `.db`, `.sqlite` and `.sqlite3` select SQLite
    #[serde(rename = "storage-path")]
    pub storage_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            storage_path: "storage.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value_with_contact() {
        let ua = UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: Some("https://example.com/about".to_string()),
            contact_email: Some("admin@example.com".to_string()),
        };
        assert_eq!(
            ua.header_value(),
            "TestCrawler/1.0 (+https://example.com/about; admin@example.com)"
        );
    }

    #[test]
    fn test_header_value_without_contact() {
        let ua = UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: None,
            contact_email: None,
        };
        assert_eq!(ua.header_value(), "TestCrawler/1.0");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.crawler.workers, 1);
        assert_eq!(config.crawler.max_retries, 3);
        assert_eq!(config.crawler.backoff(), Duration::from_secs(5));
        assert_eq!(config.crawler.max_rate_limit_retries, None);
        assert_eq!(config.output.storage_path, "storage.json");
    }
}
