//! Tuning constants for the capture loop
//!
//! **Before changing any constant**, read its documentation comment and
//! check the interaction with the serial read timeout.

/// Capture loop timing and sizing
pub mod capture {
    /// Name of the capture thread (visible in debuggers and panic messages)
    pub const THREAD_NAME: &str = "kiss-capture";

    /// Bytes requested by the blocking read that opens each cycle
    ///
    /// **Value**: 1 byte
    ///
    /// **Rationale**: The blocking read only has to wake the loop as soon as
    /// the TNC sends anything. Whatever else has arrived is then collected by
    /// the non-blocking pending read, so a cycle returns promptly instead of
    /// waiting for a larger buffer to fill until the timeout.
    pub const BLOCKING_READ_LEN: usize = 1;

    /// Upper bound for the non-blocking read of pending bytes
    ///
    /// **Value**: 64 KiB
    ///
    /// **Rationale**: At 9600 baud a full second of traffic is under 1 KiB,
    /// and USB serial drivers buffer at most a few KiB. The cap only guards
    /// against a driver reporting a bogus pending count; anything beyond it
    /// is picked up on the next cycle.
    pub const MAX_PENDING_READ: usize = 64 * 1024;
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_constants_sane() {
        assert_eq!(capture::BLOCKING_READ_LEN, 1);
        assert!(capture::MAX_PENDING_READ >= 1024);
        assert!(!capture::THREAD_NAME.is_empty());
    }
}
