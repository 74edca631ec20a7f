//! # Capture Runtime
//!
//! Runtime support for background capture loops.
//!
//! This crate defines:
//! - **Logging macros**: `tnc_debug!` and friends, forwarding to the `log` facade
//! - **Cancellation**: a shared stop flag and bounded polling waits
//! - **Supervision**: named worker threads with a done signal and bounded join
//! - **Hand-off queue**: the single synchronized point where a worker passes
//!   results to other threads
//!
//! ## Architecture
//!
//! - **Single owner**: state mutated by a worker stays on that worker's thread
//! - **Cooperative stop**: workers check a `StopFlag` between blocking calls
//! - **Bounded shutdown**: callers never wait on a worker without a deadline
//!
//! ## Example
//!
//! ```ignore
//! use capture_runtime::{spawn_supervised, StopFlag};
//!
//! let stop = StopFlag::new();
//! let worker_stop = stop.clone();
//! let handle = spawn_supervised("worker", move || {
//!     while !worker_stop.is_stop_requested() {
//!         // one bounded unit of work
//!     }
//! })?;
//!
//! stop.request_stop();
//! handle.join_timeout(Duration::from_secs(2), Duration::from_millis(50))?;
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod cancellation;
pub mod channels;
pub mod logging;
pub mod supervision;

#[doc(hidden)]
pub use log;

pub use cancellation::{wait_until, StopFlag, DEFAULT_CANCEL_POLL_MS};
pub use channels::HandoffQueue;
pub use supervision::{spawn_supervised, SupervisionConfig, TaskError, TaskHandle};
