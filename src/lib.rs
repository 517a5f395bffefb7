//! Frontier-Crawl: a polite single-site crawler
//!
//! This crate crawls one site from a seed URL, following in-scope links while
//! respecting robots.txt, backing off when rate limited, and retrying transient
//! failures. The heart of it is the frontier scheduler in [`crawler`].

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Frontier-Crawl operations
///
/// Only startup and shutdown failures surface through this type. Failures
/// tied to a single URL are classified and absorbed by the worker loop.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Invalid start URL {url}: {source}")]
    InvalidStartUrl { url: String, source: UrlError },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, Coordinator, Frontier, Outcome, Scheduler, WorkItem};
pub use crate::url::{validate_start_url, LinkFilter, SiteScope};
