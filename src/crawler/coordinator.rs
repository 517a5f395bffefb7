//! Crawler coordinator - wires a crawl together from configuration
//!
//! This module turns a [`Config`] into a ready-to-run [`Scheduler`]:
//! - Validating the start URL and deriving the crawl scope from it
//! - Building the HTTP client
//! - Fetching robots.txt for the politeness policy
//! - Opening the result store

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, HttpFetcher};
use crate::crawler::parser::HtmlLinkExtractor;
use crate::crawler::scheduler::{Collaborators, Scheduler, SchedulerSettings};
use crate::output::CrawlStatistics;
use crate::robots::RobotsPolicy;
use crate::storage::open_store;
use crate::url::{normalize_url, SiteScope};
use crate::{CrawlError, UrlError};
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    scheduler: Scheduler,
    start_url: Url,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Fails before any worker runs if the start URL is missing or invalid,
    /// the HTTP client cannot be built, or the store cannot be opened.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    pub async fn new(config: Config) -> Result<Self, CrawlError> {
        let raw_start = config.crawler.start_url.clone().ok_or_else(|| {
            CrawlError::InvalidStartUrl {
                url: String::new(),
                source: UrlError::Parse("no start URL configured".to_string()),
            }
        })?;

        let scope = SiteScope::new(&raw_start).map_err(|source| {
            tracing::error!("Not crawling, invalid start URL {}: {}", raw_start, source);
            CrawlError::InvalidStartUrl {
                url: raw_start.clone(),
                source,
            }
        })?;
        let start_url = normalize_url(scope.base().clone());
        tracing::info!("Crawl scope for {}: {}", start_url, scope.pattern());

        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;

        let policy = RobotsPolicy::fetch(
            &client,
            &start_url,
            config.user_agent.crawler_name.clone(),
            config.crawler.default_crawl_delay(),
        )
        .await;

        let store = open_store(Path::new(&config.output.storage_path))?;

        let scheduler = Scheduler::new(
            Collaborators {
                fetcher: Arc::new(HttpFetcher::new(client)),
                extractor: Arc::new(HtmlLinkExtractor),
                filter: Arc::new(scope),
                policy: Arc::new(policy),
                store,
            },
            SchedulerSettings::from(&config.crawler),
        );

        Ok(Self {
            scheduler,
            start_url,
        })
    }

    /// The normalized URL the crawl starts from
    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Runs the crawl to completion
    pub async fn run(&self) -> Result<CrawlStatistics, CrawlError> {
        self.scheduler.run(self.start_url.clone()).await
    }
}

/// Runs a complete crawl
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the start URL
/// 2. Fetch robots.txt and open the result store
/// 3. Crawl until the frontier drains
/// 4. Flush the result store
///
/// # Example
///
/// ```no_run
/// use frontier_crawl::{crawl, Config};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = Config::default();
/// config.crawler.start_url = Some("https://example.com/".to_string());
/// let stats = crawl(config).await?;
/// println!("Recorded {} URLs", stats.recorded);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> Result<CrawlStatistics, CrawlError> {
    let coordinator = Coordinator::new(config).await?;
    coordinator.run().await
}
