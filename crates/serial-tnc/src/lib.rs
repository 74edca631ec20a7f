//! # Serial TNC
//!
//! Controller for KISS TNCs connected via a serial device.
//!
//! ## Components
//!
//! - **CaptureSession**: background thread that reads the device, decodes
//!   KISS frames and posts them to the delivery collaborator
//! - **SerialTnc**: lifecycle controller (verify, start, stop, poll frames)
//! - **configure**: builds a controller from the `serial_tnc` config section
//!
//! ## Example
//!
//! ```ignore
//! use serial_tnc::{configure, TncConfig};
//! use tnc_protocol::Destination;
//!
//! let config = TncConfig::from_json_str(&raw)?;
//! if let Some(mut tnc) = configure(&config, uploader)? {
//!     tnc.verify()?;
//!     tnc.start(Some(Destination::new("api.example.org", 5050)), "sat-42")?;
//!     // ...
//!     tnc.stop()?;
//! }
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod config;
pub mod constants;
pub mod controller;
pub mod session;

pub use config::{configure, TncConfig};
pub use controller::SerialTnc;
pub use session::CaptureSession;
