use crate::session::CaptureSession;
use capture_runtime::{tnc_error, tnc_info, tnc_warn, SupervisionConfig};
use core_types::{ByteStream, DeviceOpener, Frame};
use std::sync::{Arc, Mutex, PoisonError};
use tnc_protocol::{ControllerState, Destination, FrameUploader, TncError};

/// Controller for a KISS TNC connected via a serial device.
///
/// Responsibilities:
/// - Check the device can be opened (`verify`)
/// - Run at most one capture session at a time (`start` / `stop`)
/// - Hand out frames captured without an uploader (`latest_frames`)
///
/// The device opener and the uploader are kept for the controller's whole
/// life and reused by every session.
pub struct SerialTnc<O, U>
where
    O: DeviceOpener,
    U: FrameUploader,
{
    opener: O,
    uploader: Arc<Mutex<U>>,
    supervision: SupervisionConfig,
    frame_limit: Option<usize>,
    session: Option<CaptureSession>,
}

impl<O, U> SerialTnc<O, U>
where
    O: DeviceOpener,
    U: FrameUploader,
{
    pub fn new(opener: O, uploader: U) -> Self {
        Self {
            opener,
            uploader: Arc::new(Mutex::new(uploader)),
            supervision: SupervisionConfig::default(),
            frame_limit: None,
            session: None,
        }
    }

    pub fn with_supervision(mut self, supervision: SupervisionConfig) -> Self {
        self.supervision = supervision;
        self
    }

    /// Bound the frames kept for `latest_frames`; the oldest are dropped first.
    pub fn with_frame_limit(mut self, frame_limit: Option<usize>) -> Self {
        self.frame_limit = frame_limit;
        self
    }

    pub fn state(&self) -> ControllerState {
        if self.session.is_some() {
            ControllerState::Running
        } else {
            ControllerState::Stopped
        }
    }

    /// True while a session exists and its loop has not exited.
    pub fn is_capturing(&self) -> bool {
        self.session.as_ref().is_some_and(CaptureSession::is_running)
    }

    pub fn device(&self) -> String {
        self.opener.describe()
    }

    /// Shared handle to the uploader, e.g. to inspect or reconfigure it.
    pub fn uploader(&self) -> Arc<Mutex<U>> {
        Arc::clone(&self.uploader)
    }

    /// Quick check that the configuration works: open the device and close it again.
    pub fn verify(&self) -> Result<(), TncError> {
        let mut stream = self.open_device()?;
        if let Err(e) = stream.close() {
            tnc_warn!("Error closing {} after verify: {}", self.device(), e);
        }
        Ok(())
    }

    /// Open the device and start capturing on a background thread.
    ///
    /// With `destination` set, frames are posted there as they arrive.
    /// With `None`, frames are only collected for `latest_frames`.
    pub fn start(
        &mut self,
        destination: Option<Destination>,
        channel_id: &str,
    ) -> Result<(), TncError> {
        if !self.state().can_start() {
            tnc_warn!("Error starting serial TNC capture: already started");
            return Err(TncError::AlreadyRunning);
        }

        let stream = self.open_device()?;

        let uploader = destination.map(|destination| {
            self.uploader
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .set_destination(destination);
            Arc::clone(&self.uploader)
        });
        let uploading = uploader.is_some();

        let session = CaptureSession::spawn(stream, uploader, channel_id, self.frame_limit)
            .map_err(|e| {
                tnc_error!("Error starting serial TNC capture: {}", e);
                TncError::from(e)
            })?;
        self.session = Some(session);

        tnc_info!(
            "Started serial TNC capture on {} (upload {})",
            self.device(),
            if uploading { "enabled" } else { "disabled" }
        );
        Ok(())
    }

    /// Stop the capture thread and wait for it to release the device.
    ///
    /// Already stopped is success. The controller is `Stopped` afterwards
    /// even when the thread failed to finish in time; that case is returned
    /// as an error.
    pub fn stop(&mut self) -> Result<(), TncError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };

        session.stop();
        match session.join(
            self.supervision.stop_timeout(),
            self.supervision.poll_interval(),
        ) {
            Ok(()) => {
                tnc_info!("Stopped serial TNC capture.");
                Ok(())
            }
            Err(e) => {
                tnc_error!("Error stopping serial TNC capture: {}", e);
                Err(e.into())
            }
        }
    }

    /// Frames captured since the last call, or `None` when not running.
    ///
    /// Only collects anything while no destination is configured; with an
    /// uploader frames are posted instead.
    pub fn latest_frames(&self) -> Option<Vec<Frame>> {
        self.session.as_ref().map(CaptureSession::peek_frames)
    }

    /// Frames discarded by the `with_frame_limit` bound during the current
    /// session, or `None` when not running.
    pub fn dropped_frames(&self) -> Option<u64> {
        self.session.as_ref().map(CaptureSession::dropped_frames)
    }

    fn open_device(&self) -> Result<O::Stream, TncError> {
        self.opener.open().map_err(|e| {
            tnc_error!("Error opening serial port {}: {}", self.device(), e);
            TncError::DeviceOpen {
                device: self.device(),
                reason: e.to_string(),
            }
        })
    }
}

impl<O, U> Drop for SerialTnc<O, U>
where
    O: DeviceOpener,
    U: FrameUploader,
{
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tnc_warn!("Serial TNC dropped without a clean stop: {}", e);
        }
    }
}
