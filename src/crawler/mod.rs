//! Crawler module for the crawl frontier and its workers
//!
//! This module contains the core crawling logic, including:
//! - The frontier queue and its completion protocol
//! - The worker pool and per-item retry/backoff state machine
//! - HTTP fetching and HTML link extraction
//! - Overall crawl coordination

mod backoff;
mod coordinator;
mod fetcher;
mod frontier;
mod outcome;
mod parser;
mod scheduler;
mod work_item;

pub use backoff::{jitter, RetryPolicy};
pub use coordinator::{crawl, Coordinator};
pub use fetcher::{build_http_client, Document, FetchError, Fetcher, HttpFetcher};
pub use frontier::{Acknowledgement, Frontier};
pub use outcome::Outcome;
pub use parser::{HtmlLinkExtractor, LinkExtractor};
pub use scheduler::{Collaborators, Scheduler, SchedulerSettings};
pub use work_item::WorkItem;
