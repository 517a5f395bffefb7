//! Worker pool draining the crawl frontier
//!
//! This module handles:
//! - Seeding the frontier and launching a fixed pool of workers
//! - The politeness delay (plus jitter) before every dequeue
//! - The per-item state machine: skip-check, policy-check, dispatch, settle
//! - Retry and backoff decisions for failed items
//! - Detecting completion, cancelling the pool and flushing results

use crate::config::CrawlerConfig;
use crate::crawler::backoff::{jitter, RetryPolicy};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::LinkExtractor;
use crate::crawler::{Frontier, Outcome, WorkItem};
use crate::output::{log_statistics, CrawlStatistics, CrawlStats};
use crate::robots::PolicySource;
use crate::storage::ResultStore;
use crate::url::LinkFilter;
use crate::CrawlError;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// The collaborators a scheduler delegates to
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub extractor: Arc<dyn LinkExtractor>,
    pub filter: Arc<dyn LinkFilter>,
    pub policy: Arc<dyn PolicySource>,
    pub store: Arc<dyn ResultStore>,
}

/// Tunables for a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Number of concurrent workers
    pub workers: usize,
    pub retry: RetryPolicy,
    /// Upper bound of the random delay added to each politeness sleep
    pub politeness_jitter: Duration,
}

impl From<&CrawlerConfig> for SchedulerSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            workers: config.workers as usize,
            retry: RetryPolicy::new(config.max_retries, config.backoff())
                .with_rate_limit_cap(config.max_rate_limit_retries),
            politeness_jitter: config.politeness_jitter(),
        }
    }
}

/// Runs a crawl to completion over a pool of workers
///
/// Every discovered URL flows through the same frontier. The crawl is over
/// when the frontier's unfinished-work counter reaches zero, at which point
/// the workers are cancelled and the result store is flushed.
pub struct Scheduler {
    shared: Arc<Shared>,
    workers: usize,
}

/// State every worker reads
struct Shared {
    frontier: Frontier,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    filter: Arc<dyn LinkFilter>,
    policy: Arc<dyn PolicySource>,
    store: Arc<dyn ResultStore>,
    retry: RetryPolicy,
    politeness_jitter: Duration,
    stats: CrawlStats,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `collaborators` - Fetcher, link extractor, link filter, crawl policy and result store
    /// * `settings` - Worker count, retry policy and politeness jitter
    pub fn new(collaborators: Collaborators, settings: SchedulerSettings) -> Self {
        let Collaborators {
            fetcher,
            extractor,
            filter,
            policy,
            store,
        } = collaborators;

        Self {
            shared: Arc::new(Shared {
                frontier: Frontier::new(),
                fetcher,
                extractor,
                filter,
                policy,
                store,
                retry: settings.retry,
                politeness_jitter: settings.politeness_jitter,
                stats: CrawlStats::default(),
            }),
            workers: settings.workers.max(1),
        }
    }

    pub fn frontier(&self) -> &Frontier {
        &self.shared.frontier
    }

    /// Current statistics
    pub fn stats(&self) -> CrawlStatistics {
        self.shared.stats.snapshot()
    }

    /// Crawls from `start` until no work is left
    ///
    /// Seeds the frontier, starts the workers, waits for the frontier to
    /// drain, cancels the workers and flushes the result store. Failures
    /// tied to individual URLs are absorbed by the workers; only a failed
    /// flush or a crashed worker is reported.
    pub async fn run(&self, start: Url) -> Result<CrawlStatistics, CrawlError> {
        tracing::info!(
            "Starting crawl of {} with {} worker(s), {} attempt(s) per URL, {:?} base backoff",
            start,
            self.workers,
            self.shared.retry.max_retries,
            self.shared.retry.base_backoff
        );

        self.shared.frontier.enqueue(WorkItem::new(start));

        let cancel = CancellationToken::new();
        let handles = self.start(self.workers, &cancel);

        self.shared.frontier.await_drained().await;
        tracing::info!("Frontier drained, stopping workers");
        cancel.cancel();

        let mut failure = None;
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
                failure.get_or_insert_with(|| CrawlError::Worker(e.to_string()));
            }
        }

        self.shared.store.flush()?;

        let stats = self.stats();
        log_statistics(&stats);

        match failure {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    /// Launches `workers` workers that run until `cancel` fires
    pub fn start(&self, workers: usize, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        (0..workers)
            .map(|id| {
                let shared = Arc::clone(&self.shared);
                let cancel = cancel.clone();
                tokio::spawn(async move { shared.work(id, cancel).await })
            })
            .collect()
    }
}

impl Shared {
    async fn work(&self, id: usize, cancel: CancellationToken) {
        tracing::debug!(worker = id, "Worker started");

        loop {
            let pause = self.policy.crawl_delay() + jitter(self.politeness_jitter);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }

            let Some(item) = self.frontier.dequeue(&cancel).await else {
                break;
            };

            // Dropped after `process` returns or panics, so any re-enqueue
            // made while processing is counted first.
            let _ack = self.frontier.acknowledgement();
            let url = item.url.clone();
            if let Err(panic) = AssertUnwindSafe(self.process(item)).catch_unwind().await {
                tracing::error!(
                    url = %url,
                    panic = %panic_message(panic.as_ref()),
                    "Processing panicked, giving up on URL"
                );
                self.stats.failed();
            }
        }

        tracing::debug!(worker = id, "Worker stopped");
    }

    async fn process(&self, mut item: WorkItem) {
        let attempt = item.begin_attempt();
        tracing::info!(url = %item.url, attempt, "Visiting");

        match self.store.contains(item.url.as_str()) {
            Ok(false) => {}
            Ok(true) => {
                tracing::debug!(url = %item.url, "Already visited, skipping");
                self.stats.skipped_visited();
                return;
            }
            Err(e) => {
                tracing::error!(url = %item.url, "Cannot check visited state, dropping: {}", e);
                self.stats.dropped();
                return;
            }
        }

        if !self.policy.can_fetch(&item.url) {
            tracing::info!(url = %item.url, "Disallowed by robots.txt, skipping");
            self.stats.policy_denied();
            return;
        }

        let outcome = self.dispatch(&item.url).await;
        tracing::debug!(url = %item.url, outcome = outcome.label(), "Classified");
        self.settle(item, outcome).await;
    }

    async fn dispatch(&self, url: &Url) -> Outcome {
        self.stats.fetched();
        match self.fetcher.fetch(url).await {
            Ok(None) => Outcome::Empty,
            Ok(Some(document)) => Outcome::Success {
                links: self
                    .extractor
                    .extract_links(self.filter.as_ref(), &document),
            },
            Err(e) => Outcome::from(e),
        }
    }

    async fn settle(&self, item: WorkItem, outcome: Outcome) {
        let url = &item.url;

        match outcome {
            Outcome::Success { links } => {
                let recorded = links.iter().map(Url::to_string).collect();
                if self.record(url, Some(recorded)) {
                    self.fan_out(url, links);
                }
            }

            Outcome::Empty => {
                tracing::debug!(url = %url, "No content");
                self.record(url, None);
            }

            Outcome::NotFound => {
                tracing::info!(url = %url, "Page not found");
                self.stats.not_found();
                self.record(url, None);
            }

            Outcome::Redirected { target } => {
                self.stats.redirected();
                if !self.record(url, None) {
                    return;
                }
                match self.filter.filter(target.as_str()) {
                    Some(target) => {
                        tracing::info!(url = %url, "Redirected to {}", target);
                        self.frontier.enqueue(WorkItem::new(target));
                        self.stats.links_enqueued(1);
                    }
                    None => {
                        tracing::info!(url = %url, "Redirected out of scope to {}", target);
                    }
                }
            }

            Outcome::RateLimited => {
                self.stats.rate_limited();
                if !self.retry.allows_rate_limit_retry(item.attempts) {
                    tracing::error!(
                        url = %url,
                        "Still rate limited after {} attempts, dropping",
                        item.attempts
                    );
                    self.stats.dropped();
                    return;
                }

                let delay = self.retry.rate_limit_delay(item.attempts);
                tracing::warn!(url = %url, "Rate limited, backing off for {:?}", delay);
                tokio::time::sleep(delay).await;
                self.stats.retried();
                self.frontier.enqueue(item);
            }

            Outcome::TransientFailure { cause } => {
                if self.retry.allows_retry(item.attempts) {
                    tracing::warn!(url = %url, "Retrying after attempt {}: {}", item.attempts, cause);
                    self.stats.retried();
                    self.frontier.enqueue(item);
                } else {
                    tracing::error!(
                        url = %url,
                        "Retries exhausted after {} attempts, dropping: {}",
                        item.attempts,
                        cause
                    );
                    self.stats.dropped();
                }
            }

            Outcome::FatalFailure { cause } => {
                tracing::error!(url = %url, "Giving up: {}", cause);
                self.stats.failed();
            }
        }
    }

    /// Writes a result, returning false (and counting a fatal failure) if
    /// the store rejects it
    fn record(&self, url: &Url, links: Option<Vec<String>>) -> bool {
        match self.store.add(url.as_str(), links) {
            Ok(()) => {
                self.stats.recorded();
                true
            }
            Err(e) => {
                tracing::error!(url = %url, "Failed to record result: {}", e);
                self.stats.failed();
                false
            }
        }
    }

    /// Queues every link not yet recorded
    fn fan_out(&self, source: &Url, links: Vec<Url>) {
        let mut enqueued = 0;
        for link in links {
            match self.store.contains(link.as_str()) {
                Ok(true) => continue,
                Ok(false) => {}
                // The skip-check after dequeue catches it if it was recorded
                Err(e) => tracing::debug!(url = %link, "Visited check failed: {}", e),
            }
            self.frontier.enqueue(WorkItem::new(link));
            enqueued += 1;
        }

        tracing::debug!(url = %source, "Queued {} new link(s)", enqueued);
        self.stats.links_enqueued(enqueued);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
