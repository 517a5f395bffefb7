//! Crawl statistics
//!
//! Workers bump these counters as they settle items; the totals are logged
//! when the crawl finishes and printed by the CLI.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by all workers
#[derive(Debug, Default)]
pub struct CrawlStats {
    fetched: AtomicU64,
    recorded: AtomicU64,
    skipped_visited: AtomicU64,
    policy_denied: AtomicU64,
    not_found: AtomicU64,
    redirected: AtomicU64,
    rate_limited: AtomicU64,
    retried: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    links_enqueued: AtomicU64,
}

macro_rules! counter {
    ($name:ident) => {
        pub fn $name(&self) {
            self.$name.fetch_add(1, Ordering::Relaxed);
        }
    };
}

/// Recording methods, one per counter
impl CrawlStats {
    counter!(fetched);
    counter!(recorded);
    counter!(skipped_visited);
    counter!(policy_denied);
    counter!(not_found);
    counter!(redirected);
    counter!(rate_limited);
    counter!(retried);
    counter!(dropped);
    counter!(failed);

    pub fn links_enqueued(&self, count: usize) {
        self.links_enqueued
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Copies the current counter values
    pub fn snapshot(&self) -> CrawlStatistics {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        CrawlStatistics {
            fetched: load(&self.fetched),
            recorded: load(&self.recorded),
            skipped_visited: load(&self.skipped_visited),
            policy_denied: load(&self.policy_denied),
            not_found: load(&self.not_found),
            redirected: load(&self.redirected),
            rate_limited: load(&self.rate_limited),
            retried: load(&self.retried),
            dropped: load(&self.dropped),
            failed: load(&self.failed),
            links_enqueued: load(&self.links_enqueued),
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Fetch calls made, whatever their result
    pub fetched: u64,

    /// URLs written to the result store
    pub recorded: u64,

    /// Dequeued items skipped because their URL was already recorded
    pub skipped_visited: u64,

    /// URLs robots.txt did not allow
    pub policy_denied: u64,

    pub not_found: u64,
    pub redirected: u64,

    /// Rate-limit responses received
    pub rate_limited: u64,

    /// Items put back in the frontier after a failure
    pub retried: u64,

    /// Items abandoned after exhausting their retries
    pub dropped: u64,

    /// Items that ended in a fatal failure
    pub failed: u64,

    /// New items queued from extracted links and redirect targets
    pub links_enqueued: u64,
}

/// Logs statistics at info level
pub fn log_statistics(stats: &CrawlStatistics) {
    tracing::info!(
        fetched = stats.fetched,
        recorded = stats.recorded,
        skipped = stats.skipped_visited,
        denied = stats.policy_denied,
        not_found = stats.not_found,
        redirected = stats.redirected,
        rate_limited = stats.rate_limited,
        retried = stats.retried,
        dropped = stats.dropped,
        failed = stats.failed,
        enqueued = stats.links_enqueued,
        "Crawl statistics"
    );
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Fetches made: {}", stats.fetched);
    println!("  URLs recorded: {}", stats.recorded);
    println!("  Links queued: {}", stats.links_enqueued);
    println!();

    println!("Outcomes:");
    println!("  Already visited: {}", stats.skipped_visited);
    println!("  Denied by robots.txt: {}", stats.policy_denied);
    println!("  Not found: {}", stats.not_found);
    println!("  Redirected: {}", stats.redirected);
    println!("  Rate limited: {}", stats.rate_limited);
    println!();

    if stats.retried > 0 || stats.dropped > 0 || stats.failed > 0 {
        println!("Failures:");
        println!("  Retried: {}", stats.retried);
        println!("  Dropped after retries: {}", stats.dropped);
        println!("  Fatal: {}", stats.failed);
        println!();
    }

    let success_rate = if stats.fetched > 0 {
        (stats.recorded as f64 / stats.fetched as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} fetches recorded)",
        success_rate, stats.recorded, stats.fetched
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot() {
        let stats = CrawlStats::default();
        stats.fetched();
        stats.fetched();
        stats.recorded();
        stats.retried();
        stats.links_enqueued(3);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.fetched, 2);
        assert_eq!(snapshot.recorded, 1);
        assert_eq!(snapshot.retried, 1);
        assert_eq!(snapshot.links_enqueued, 3);
        assert_eq!(snapshot.dropped, 0);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let stats = CrawlStats::default();
        let before = stats.snapshot();
        stats.not_found();
        assert_eq!(before.not_found, 0);
        assert_eq!(stats.snapshot().not_found, 1);
    }
}
