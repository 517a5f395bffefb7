//! Robots.txt handling module
//!
//! This module fetches and parses a site's robots.txt and exposes it to the
//! scheduler as a [`PolicySource`]: a fetch-permission predicate plus the
//! politeness delay workers wait out before every dequeue.

mod parser;

pub use parser::ParsedRobots;

use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Crawl policy consulted by the scheduler
pub trait PolicySource: Send + Sync {
    /// Returns true if the site permits fetching `url`
    fn can_fetch(&self, url: &Url) -> bool;

    /// Minimum wait between a worker's successive fetch attempts
    fn crawl_delay(&self) -> Duration;
}

/// A [`PolicySource`] backed by a site's robots.txt
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    robots: ParsedRobots,
    user_agent: String,
    default_delay: Duration,
}

impl RobotsPolicy {
    /// Creates a policy from already-parsed rules
    ///
    /// # Arguments
    ///
    /// * `robots` - The parsed robots.txt
    /// * `user_agent` - Product token matched against `User-agent` groups
    /// * `default_delay` - Politeness delay when robots.txt sets no Crawl-delay
    pub fn new(robots: ParsedRobots, user_agent: impl Into<String>, default_delay: Duration) -> Self {
        Self {
            robots,
            user_agent: user_agent.into(),
            default_delay,
        }
    }

    /// Fetches robots.txt for `site_root` and builds a policy from it
    pub async fn fetch(
        client: &Client,
        site_root: &Url,
        user_agent: impl Into<String>,
        default_delay: Duration,
    ) -> Self {
        let robots = fetch_robots(client, site_root).await;
        let policy = Self::new(robots, user_agent, default_delay);
        tracing::info!(
            "Politeness delay for {}: {:?}",
            site_root,
            policy.crawl_delay()
        );
        policy
    }

    pub fn robots(&self) -> &ParsedRobots {
        &self.robots
    }
}

impl PolicySource for RobotsPolicy {
    fn can_fetch(&self, url: &Url) -> bool {
        self.robots.is_allowed(url.as_str(), &self.user_agent)
    }

    fn crawl_delay(&self) -> Duration {
        self.robots
            .crawl_delay(&self.user_agent)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(self.default_delay)
    }
}

/// Location of robots.txt for the site `site_root` belongs to
pub fn robots_url(site_root: &Url) -> Result<Url, url::ParseError> {
    site_root.join("/robots.txt")
}

/// Fetches and parses robots.txt for a site
///
/// # Status handling
///
/// | Response | Result |
/// |----------|--------|
/// | 2xx | Parsed content |
/// | 401, 403 | Disallow everything |
/// | Other status | Allow everything |
/// | Transport error | Allow everything |
pub async fn fetch_robots(client: &Client, site_root: &Url) -> ParsedRobots {
    let url = match robots_url(site_root) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL for {}: {}", site_root, e);
            return ParsedRobots::allow_all();
        }
    };

    tracing::debug!("Fetching {}", url);
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {} - allowing all", url, e);
            return ParsedRobots::allow_all();
        }
    };

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        tracing::warn!("{} answered {} - disallowing all", url, status);
        return ParsedRobots::disallow_all();
    }
    if !status.is_success() {
        tracing::info!("{} answered {} - allowing all", url, status);
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            tracing::warn!("Failed to read {}: {} - allowing all", url, e);
            ParsedRobots::allow_all()
        }
    }
}
