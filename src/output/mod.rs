//! Output module for crawl reporting
//!
//! The crawl's durable output is the result store (see [`crate::storage`]);
//! this module covers the statistics reported alongside it.

pub mod stats;

pub use stats::{log_statistics, print_statistics, CrawlStatistics, CrawlStats};
