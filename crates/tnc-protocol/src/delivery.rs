use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Remote collector address frames are posted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub host: String,
    pub port: u16,
}

impl Destination {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Status reported by the collaborator when a post fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}, {message}")]
pub struct DeliveryStatus {
    pub code: i32,
    pub message: String,
}

impl DeliveryStatus {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Delivery collaborator that transmits decoded frames to a remote collector.
///
/// One instance lives for the whole controller and is reused by every
/// capture session, one session at a time. It is never called concurrently.
pub trait FrameUploader: Send + 'static {
    /// Post one frame. `timestamp_secs` is Unix time of the read cycle
    /// that produced it.
    fn post_frame(
        &mut self,
        channel_id: &str,
        timestamp_secs: u64,
        frame: &[u8],
    ) -> Result<(), DeliveryStatus>;

    /// Current destination, used for failure log context.
    fn destination(&self) -> Destination;

    /// Configure where subsequent posts go.
    fn set_destination(&mut self, destination: Destination);
}
