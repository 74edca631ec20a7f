//! Hand-off queue between a worker thread and its pollers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// FIFO shared between one producing worker and any number of draining callers.
///
/// Unbounded unless a limit is set. With a limit, pushing onto a full queue
/// drops the oldest entries and counts them.
///
/// Draining takes everything queued at that moment; there are no partial
/// drains and nothing is replayed.
pub struct HandoffQueue<T> {
    inner: Arc<Mutex<VecDeque<T>>>,
    limit: Option<usize>,
    dropped: Arc<AtomicU64>,
}

impl<T> HandoffQueue<T> {
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
            limit,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Append items in order. Returns how many old items were dropped to make room.
    pub fn push_all<I>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut queue = self.lock();
        queue.extend(items);

        let Some(limit) = self.limit else {
            return 0;
        };

        let overflow = queue.len().saturating_sub(limit);
        if overflow > 0 {
            queue.drain(..overflow);
            self.dropped.fetch_add(overflow as u64, Ordering::Relaxed);
            crate::tnc_warn!(
                "Hand-off queue full ({} entries): dropped {} oldest",
                limit,
                overflow
            );
        }
        overflow
    }

    /// Remove and return everything queued, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Total items discarded by the overflow policy since creation.
    pub fn dropped_total(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    // A panic while holding the lock cannot leave the deque half-modified,
    // so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Clone for HandoffQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            limit: self.limit,
            dropped: Arc::clone(&self.dropped),
        }
    }
}

impl<T> Default for HandoffQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
