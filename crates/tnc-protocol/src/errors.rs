//! Error Handling Guidelines
//!
//! All error messages should follow this format:
//!
//! 1. **What failed**: Describe the operation that failed
//! 2. **Why it failed**: Provide the root cause if known
//!
//! Examples:
//! - ✅ "Failed to open /dev/ttyUSB0 @ 9600: Permission denied"
//! - ❌ "Open failed" (lacks device and cause)

use capture_runtime::TaskError;
use thiserror::Error;

/// Unified error type for controller operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TncError {
    /// `start` called while a capture session is active
    #[error("Capture already started")]
    AlreadyRunning,

    /// The serial device could not be opened
    #[error("Failed to open {device}: {reason}")]
    DeviceOpen { device: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The capture thread failed to spawn, stop in time, or exited by panicking
    #[error(transparent)]
    Worker(#[from] TaskError),
}

impl TncError {
    /// True when the capture thread was left running after `stop`.
    pub fn is_stop_timeout(&self) -> bool {
        matches!(self, Self::Worker(TaskError::StillRunning { .. }))
    }
}
