//! # TNC Protocol
//!
//! Types shared between the capture controller and its collaborators.
//!
//! It has no dependency on serial hardware, making it fully testable in
//! isolation.
//!
//! ## Contents
//!
//! - **ControllerState**: `Stopped` / `Running` lifecycle of the controller
//! - **TncError**: failures reported by lifecycle operations
//! - **FrameUploader**: the delivery collaborator contract, with
//!   `Destination` and `DeliveryStatus`
//!
//! ## Frame Flow
//!
//! ```text
//! serial bytes → KissDecoder → CaptureSession ─┬→ FrameUploader::post_frame
//!                                              └→ hand-off queue → latest_frames()
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod delivery;
pub mod errors;
pub mod state;

pub use delivery::{DeliveryStatus, Destination, FrameUploader};
pub use errors::TncError;
pub use state::ControllerState;
