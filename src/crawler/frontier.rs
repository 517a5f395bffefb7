//! The crawl frontier and its completion protocol
//!
//! The frontier is a FIFO queue of [`WorkItem`]s paired with an
//! unfinished-work counter. Every `enqueue` raises the counter and every
//! `acknowledge` lowers it, so the counter reaches zero only once every item
//! ever queued has been settled. Workers must re-enqueue retried or derived
//! items *before* acknowledging the item they came from; [`Acknowledgement`]
//! makes that ordering hard to get wrong by acknowledging on drop.
//!
//! Waiting workers are woken through a semaphore holding one permit per
//! queued item, so a burst of enqueues wakes as many idle workers.

use crate::crawler::WorkItem;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, Semaphore};
use tokio_util::sync::CancellationToken;

/// Concurrent work queue with completion tracking
#[derive(Debug)]
pub struct Frontier {
    queue: Mutex<VecDeque<WorkItem>>,
    /// One permit per queued item
    available: Semaphore,
    unfinished: watch::Sender<usize>,
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontier {
    pub fn new() -> Self {
        let (unfinished, _) = watch::channel(0);
        Self {
            queue: Mutex::new(VecDeque::new()),
            available: Semaphore::new(0),
            unfinished,
        }
    }

    /// Appends an item and counts it as unfinished
    pub fn enqueue(&self, item: WorkItem) {
        // Count first so a concurrent drain check can never observe the item
        // in the queue without it being counted.
        self.unfinished.send_modify(|n| *n += 1);
        self.queue().push_back(item);
        self.available.add_permits(1);
    }

    /// Waits for the next item
    ///
    /// Returns `None` once `cancel` fires, without taking anything from the
    /// queue. A `Some` return must be followed by exactly one
    /// [`acknowledge`](Self::acknowledge).
    pub async fn dequeue(&self, cancel: &CancellationToken) -> Option<WorkItem> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                permit = self.available.acquire() => match permit {
                    Ok(permit) => permit.forget(),
                    // Never closed while `self` is alive
                    Err(_) => return None,
                },
            }

            let next = self.queue().pop_front();
            if next.is_some() {
                return next;
            }
            tracing::error!("Frontier permit taken with an empty queue");
        }
    }

    /// Marks one dequeued item as settled
    pub fn acknowledge(&self) {
        let decremented = self.unfinished.send_if_modified(|n| {
            if *n == 0 {
                false
            } else {
                *n -= 1;
                true
            }
        });

        if !decremented {
            tracing::error!("Frontier acknowledged more items than were enqueued");
        }
    }

    /// Returns a guard that acknowledges one item when dropped
    pub fn acknowledgement(&self) -> Acknowledgement<'_> {
        Acknowledgement { frontier: self }
    }

    /// Resolves once every enqueued item has been acknowledged
    pub async fn await_drained(&self) {
        let mut unfinished = self.unfinished.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = unfinished.wait_for(|n| *n == 0).await;
    }

    /// Items enqueued but not yet acknowledged, including ones in flight
    pub fn unfinished(&self) -> usize {
        *self.unfinished.borrow()
    }

    /// Items waiting in the queue
    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<WorkItem>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Acknowledges one frontier item when dropped
///
/// Taken right after a successful dequeue, it guarantees the acknowledgement
/// happens however processing exits, and after any re-enqueue made while it
/// was alive.
#[must_use = "dropping the guard acknowledges immediately"]
pub struct Acknowledgement<'a> {
    frontier: &'a Frontier,
}

impl Drop for Acknowledgement<'_> {
    fn drop(&mut self) {
        self.frontier.acknowledge();
    }
}
