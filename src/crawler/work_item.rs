//! Work items queued in the frontier

use url::Url;

/// One pending visit of a URL
///
/// `attempts` counts how many times a worker has taken this URL up for
/// processing. It survives re-enqueueing, so a retried URL carries its
/// history with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: Url,
    pub attempts: u32,
}

impl WorkItem {
    /// Creates an item for a newly discovered URL
    pub fn new(url: Url) -> Self {
        Self { url, attempts: 0 }
    }

    /// Marks the start of a processing attempt and returns the new count
    ///
    /// The scheduler calls this exactly once per dequeue.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }
}
