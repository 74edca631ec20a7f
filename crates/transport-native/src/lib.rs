//! # Native Transport
//!
//! Serial port access for KISS TNCs on Linux, macOS and Windows, built on
//! the `serialport` crate.
//!
//! Every port is opened with a finite read timeout: the capture loop only
//! checks for a stop request between reads.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use core_types::{ByteStream, DeviceOpener, SerialConfig, TransportError};
use serialport::SerialPort;
use std::io::{ErrorKind, Read};

/// Opens the configured serial device on demand.
#[derive(Debug, Clone)]
pub struct SerialOpener {
    config: SerialConfig,
}

impl SerialOpener {
    pub fn new(config: SerialConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl DeviceOpener for SerialOpener {
    type Stream = NativeSerialStream;

    fn open(&self) -> Result<NativeSerialStream, TransportError> {
        let port = serialport::new(&self.config.device, self.config.baud)
            .timeout(self.config.read_timeout())
            .open()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        log::debug!(
            "Opened {} (read timeout {}ms)",
            self.describe(),
            self.config.read_timeout_ms
        );

        Ok(NativeSerialStream {
            device: self.config.device.clone(),
            port: Some(port),
        })
    }

    fn describe(&self) -> String {
        format!("{} @ {}", self.config.device, self.config.baud)
    }
}

/// An open serial port.
pub struct NativeSerialStream {
    device: String,
    port: Option<Box<dyn SerialPort>>,
}

impl NativeSerialStream {
    pub fn device(&self) -> &str {
        &self.device
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::NotConnected)
    }
}

impl ByteStream for NativeSerialStream {
    fn read_available(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        let port = self.port()?;
        if max_len == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; max_len];
        match port.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            // Timeout is the normal idle case
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::Interrupted => {
                Ok(Vec::new())
            }
            Err(e) => Err(TransportError::Io(e.to_string())),
        }
    }

    fn pending_byte_count(&mut self) -> Result<usize, TransportError> {
        let pending = self
            .port()?
            .bytes_to_read()
            .map_err(|e| TransportError::Io(e.to_string()))?;
        Ok(usize::try_from(pending).unwrap_or(usize::MAX))
    }

    fn close(&mut self) -> Result<(), TransportError> {
        // Dropping the handle releases the OS descriptor
        if self.port.take().is_some() {
            log::debug!("Closed {}", self.device);
        }
        Ok(())
    }
}
