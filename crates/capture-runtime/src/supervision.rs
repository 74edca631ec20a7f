//! Supervision utilities for worker threads
//!
//! Workers run on named threads and signal completion through a oneshot
//! channel, so the controlling side can wait with a deadline and report a
//! stuck worker instead of hanging on `join`.
use crate::cancellation::{wait_until, DEFAULT_CANCEL_POLL_MS};
use futures_channel::oneshot;
use serde::{Deserialize, Serialize};
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The OS refused to create the thread
    #[error("Failed to spawn worker thread '{name}': {reason}")]
    Spawn { name: String, reason: String },

    /// The worker did not finish before the deadline. It has been detached.
    #[error("Worker thread '{name}' still running after {waited_ms}ms")]
    StillRunning { name: String, waited_ms: u64 },

    /// The worker panicked
    #[error("Worker thread '{name}' panicked: {message}")]
    Panicked { name: String, message: String },
}

/// Timeout configuration for supervised workers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupervisionConfig {
    /// How long `stop` waits for a worker to confirm it finished
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
    /// How often the done signal is polled while waiting
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_stop_timeout_ms() -> u64 {
    2_000
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_CANCEL_POLL_MS
}

impl Default for SupervisionConfig {
    fn default() -> Self {
        Self {
            stop_timeout_ms: default_stop_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl SupervisionConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Sends the done signal when the worker closure returns or unwinds.
struct DoneGuard(Option<oneshot::Sender<()>>);

impl Drop for DoneGuard {
    fn drop(&mut self) {
        if let Some(done_tx) = self.0.take() {
            let _ = done_tx.send(());
        }
    }
}

/// Handle to a supervised worker thread.
pub struct TaskHandle {
    name: String,
    thread: JoinHandle<()>,
    done_rx: oneshot::Receiver<()>,
}

impl TaskHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the worker closure has returned (or panicked).
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait up to `timeout` for the worker's done signal, then join it.
    ///
    /// On timeout the thread is detached and `StillRunning` is returned;
    /// there is no forced termination.
    pub fn join_timeout(
        mut self,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<(), TaskError> {
        let done = wait_until(timeout, poll_interval, || {
            // Canceled means the sender is gone, which only happens once the worker has exited.
            !matches!(self.done_rx.try_recv(), Ok(None))
        });

        if !done {
            return Err(TaskError::StillRunning {
                name: self.name,
                waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            });
        }

        let name = self.name;
        self.thread.join().map_err(|payload| TaskError::Panicked {
            name,
            message: panic_message(payload.as_ref()),
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run `work` on a new named thread that signals completion when it exits.
pub fn spawn_supervised<F>(name: &str, work: F) -> Result<TaskHandle, TaskError>
where
    F: FnOnce() + Send + 'static,
{
    let (done_tx, done_rx) = oneshot::channel();

    let thread = std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let _done = DoneGuard(Some(done_tx));
            work();
        })
        .map_err(|e| TaskError::Spawn {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

    Ok(TaskHandle {
        name: name.to_string(),
        thread,
        done_rx,
    })
}
