use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Read timeout applied to serial devices unless configured otherwise.
///
/// The capture loop only notices a stop request between reads, so this
/// bounds how long `stop` can take.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 500;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Not connected")]
    NotConnected,
}

/// A blocking byte stream with a bounded read timeout (serial port, test double).
///
/// Implementations must honour a finite read timeout, otherwise a capture
/// loop built on top of them cannot be stopped.
pub trait ByteStream: Send {
    /// Read up to `max_len` bytes.
    ///
    /// Blocks until at least one byte is available or the stream's read
    /// timeout expires, in which case an empty vector is returned.
    fn read_available(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError>;

    /// Number of bytes that can be read right now without blocking.
    fn pending_byte_count(&mut self) -> Result<usize, TransportError>;

    /// Release the underlying device. Reads after close fail with `NotConnected`.
    fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens fresh handles to a device. Kept by the controller across sessions.
pub trait DeviceOpener: Send + Sync {
    type Stream: ByteStream + 'static;

    fn open(&self) -> Result<Self::Stream, TransportError>;

    /// Human readable device description for log messages (e.g. `/dev/ttyUSB0 @ 9600`).
    fn describe(&self) -> String;
}

/// Serial device settings, as read from the `serial_tnc` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub device: String,
    /// Communication rate in baud.
    pub baud: u32,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

impl SerialConfig {
    pub fn new(device: impl Into<String>, baud: u32) -> Self {
        Self {
            device: device.into(),
            baud,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Check the settings describe an openable, stoppable device.
    pub fn validate(&self) -> Result<(), String> {
        if self.device.trim().is_empty() {
            return Err("Invalid device: path must not be empty".into());
        }
        if self.baud == 0 {
            return Err(format!(
                "Invalid baud rate for {}: must be greater than 0",
                self.device
            ));
        }
        if self.read_timeout_ms == 0 {
            return Err(format!(
                "Invalid read timeout for {}: must be greater than 0ms",
                self.device
            ));
        }
        Ok(())
    }
}
