use crate::constants::capture;
use capture_runtime::{
    spawn_supervised, tnc_debug, tnc_error, tnc_info, tnc_warn, HandoffQueue, StopFlag,
    TaskError, TaskHandle,
};
use core_types::{ByteStream, Frame, TransportError};
use framing::KissDecoder;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tnc_protocol::FrameUploader;

/// One run of the background read → decode → deliver loop.
///
/// The loop runs on its own thread and owns the byte stream and the KISS
/// decoder. Frames reach other threads only through `peek_frames` (when no
/// uploader is configured) or through the uploader itself.
///
/// Stopping is cooperative: `stop` sets a flag that the loop checks between
/// reads, so the stream's read timeout bounds how long `join` has to wait.
pub struct CaptureSession {
    channel_id: String,
    stop: StopFlag,
    frames: HandoffQueue<Frame>,
    task: TaskHandle,
}

impl CaptureSession {
    /// Start capturing from `stream` on a new thread.
    ///
    /// With `uploader` set, every frame is posted as soon as it is decoded.
    /// Without it, frames accumulate (up to `frame_limit`, drop-oldest) until
    /// drained with `peek_frames`.
    pub fn spawn<S, U>(
        stream: S,
        uploader: Option<Arc<Mutex<U>>>,
        channel_id: &str,
        frame_limit: Option<usize>,
    ) -> Result<Self, TaskError>
    where
        S: ByteStream + 'static,
        U: FrameUploader,
    {
        let stop = StopFlag::new();
        let frames = HandoffQueue::with_limit(frame_limit);

        let capture_loop = CaptureLoop::new(
            stream,
            uploader,
            channel_id.to_string(),
            frames.clone(),
            stop.clone(),
        );
        let task = spawn_supervised(capture::THREAD_NAME, move || capture_loop.run())?;

        Ok(Self {
            channel_id: channel_id.to_string(),
            stop,
            frames,
            task,
        })
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Ask the loop to exit after the current read cycle. Idempotent.
    pub fn stop(&self) {
        self.stop.request_stop();
    }

    /// Take every frame captured and not yet delivered or drained.
    pub fn peek_frames(&self) -> Vec<Frame> {
        self.frames.drain()
    }

    /// Frames discarded because the hand-off queue was full.
    pub fn dropped_frames(&self) -> u64 {
        self.frames.dropped_total()
    }

    /// False once the loop has exited, after `stop` or a transport failure.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Wait up to `timeout` for the loop thread to finish.
    ///
    /// Call `stop` first. A thread still running at the deadline is detached.
    pub fn join(self, timeout: Duration, poll_interval: Duration) -> Result<(), TaskError> {
        self.task.join_timeout(timeout, poll_interval)
    }
}

/// State owned by the capture thread.
pub(crate) struct CaptureLoop<S, U> {
    stream: S,
    decoder: KissDecoder,
    uploader: Option<Arc<Mutex<U>>>,
    channel_id: String,
    frames: HandoffQueue<Frame>,
    stop: StopFlag,
}

impl<S, U> CaptureLoop<S, U>
where
    S: ByteStream,
    U: FrameUploader,
{
    pub(crate) fn new(
        stream: S,
        uploader: Option<Arc<Mutex<U>>>,
        channel_id: String,
        frames: HandoffQueue<Frame>,
        stop: StopFlag,
    ) -> Self {
        Self {
            stream,
            decoder: KissDecoder::new(),
            uploader,
            channel_id,
            frames,
            stop,
        }
    }

    pub(crate) fn run(mut self) {
        tnc_debug!("CaptureSession: loop started for {}", self.channel_id);

        while !self.stop.is_stop_requested() {
            if let Err(e) = self.run_cycle() {
                tnc_error!("Serial read failed, capture stopped: {}", e);
                break;
            }
        }

        if let Err(e) = self.stream.close() {
            tnc_warn!("Error closing serial device: {}", e);
        }

        tnc_info!(
            "CaptureSession: loop finished ({} decode anomalies)",
            self.decoder.anomaly_count()
        );
    }

    /// One read cycle. Returns the number of frames completed in it.
    pub(crate) fn run_cycle(&mut self) -> Result<usize, TransportError> {
        let data = self.read_cycle()?;
        if !data.is_empty() {
            tnc_debug!("Received serial data: {:02x?}", data);
        }

        self.decoder.write(&data);
        let frames = self.decoder.read_frames();
        let count = frames.len();
        if count == 0 {
            return Ok(0);
        }

        match &self.uploader {
            Some(uploader) => self.deliver(uploader, frames),
            None => {
                self.frames.push_all(frames);
            }
        }

        Ok(count)
    }

    /// Block for the first byte, then take whatever else is already buffered.
    fn read_cycle(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut data = self.stream.read_available(capture::BLOCKING_READ_LEN)?;

        let pending = self.stream.pending_byte_count()?;
        if pending > 0 {
            let more = self
                .stream
                .read_available(pending.min(capture::MAX_PENDING_READ))?;
            data.extend(more);
        }

        Ok(data)
    }

    fn deliver(&self, uploader: &Mutex<U>, frames: Vec<Frame>) {
        // One timestamp for everything decoded in this cycle
        let timestamp = unix_timestamp();
        let mut uploader = uploader.lock().unwrap_or_else(PoisonError::into_inner);

        for frame in frames {
            match uploader.post_frame(&self.channel_id, timestamp, frame.payload()) {
                Ok(()) => tnc_debug!("Posted TNC frame: {:02x?}", frame.payload()),
                Err(status) => tnc_warn!(
                    "Error uploading packet to {}: {}",
                    uploader.destination(),
                    status
                ),
            }
        }
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
