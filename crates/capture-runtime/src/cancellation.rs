//! Cancellation utilities for interruptible capture loops
//!
//! Stopping is cooperative: a worker checks its `StopFlag` between bounded
//! blocking calls, and the controlling thread polls for completion with a
//! deadline instead of waiting forever.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default poll interval for cancellation checks (50ms)
pub const DEFAULT_CANCEL_POLL_MS: u64 = 50;

/// Shared, idempotent stop request.
///
/// Clones observe the same flag. Once set it stays set.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    requested: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

/// Poll `condition` every `poll_interval` until it holds or `timeout` elapses.
///
/// The condition is always checked at least once, and once more at the
/// deadline. Returns whether it held.
pub fn wait_until<F>(timeout: Duration, poll_interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }

        let now = Instant::now();
        if now >= deadline {
            return false;
        }

        let remaining = deadline - now;
        std::thread::sleep(remaining.min(poll_interval));
    }
}
