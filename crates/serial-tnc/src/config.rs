use crate::controller::SerialTnc;
use capture_runtime::SupervisionConfig;
use core_types::SerialConfig;
use serde::{Deserialize, Serialize};
use tnc_protocol::{FrameUploader, TncError};
use transport_native::SerialOpener;

/// Driver configuration.
///
/// ```json
/// {
///   "serial_tnc": { "device": "/dev/ttyUSB0", "baud": 9600 },
///   "supervision": { "stop_timeout_ms": 2000 },
///   "max_queued_frames": 10000
/// }
/// ```
///
/// Without a `serial_tnc` section no serial TNC is configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TncConfig {
    #[serde(default)]
    pub serial_tnc: Option<SerialConfig>,
    #[serde(default)]
    pub supervision: SupervisionConfig,
    /// Bound on frames held for polling. Unbounded when absent.
    #[serde(default)]
    pub max_queued_frames: Option<usize>,
}

impl TncConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, TncError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| TncError::Config(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TncError> {
        if self.supervision.poll_interval_ms == 0 {
            return Err(TncError::Config(
                "Invalid poll interval: must be greater than 0ms".into(),
            ));
        }

        if self.max_queued_frames == Some(0) {
            return Err(TncError::Config(
                "Invalid max_queued_frames: must be greater than 0 (omit for unbounded)".into(),
            ));
        }

        let Some(serial) = &self.serial_tnc else {
            return Ok(());
        };
        serial.validate().map_err(TncError::Config)?;

        // stop() only gets noticed between reads
        if serial.read_timeout_ms >= self.supervision.stop_timeout_ms {
            return Err(TncError::Config(format!(
                "Read timeout ({}ms) must be shorter than the stop timeout ({}ms)",
                serial.read_timeout_ms, self.supervision.stop_timeout_ms
            )));
        }

        Ok(())
    }
}

/// Build a serial TNC controller if the configuration has a `serial_tnc` section.
pub fn configure<U>(
    config: &TncConfig,
    uploader: U,
) -> Result<Option<SerialTnc<SerialOpener, U>>, TncError>
where
    U: FrameUploader,
{
    config.validate()?;

    let Some(serial) = &config.serial_tnc else {
        return Ok(None);
    };

    let tnc = SerialTnc::new(SerialOpener::new(serial.clone()), uploader)
        .with_supervision(config.supervision.clone())
        .with_frame_limit(config.max_queued_frames);
    Ok(Some(tnc))
}
