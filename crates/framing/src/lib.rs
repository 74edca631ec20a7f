//! Streaming KISS frame extraction.
//!
//! KISS protocol reference: <http://www.ka9q.net/papers/kiss.html>

pub mod kiss;

pub use kiss::{DecodeAnomaly, KissDecoder, FEND, FESC, TFEND, TFESC};
