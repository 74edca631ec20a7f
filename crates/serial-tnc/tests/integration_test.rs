//! Integration tests for the serial TNC controller
//!
//! These tests drive the full start → capture → stop lifecycle against an
//! in-memory device that tests feed with bytes while capture is running.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use capture_runtime::{wait_until, SupervisionConfig};
use core_types::{ByteStream, DeviceOpener, Frame, TransportError};
use serial_tnc::SerialTnc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tnc_protocol::{ControllerState, DeliveryStatus, Destination, FrameUploader, TncError};

const WAIT: Duration = Duration::from_secs(5);
const POLL: Duration = Duration::from_millis(5);

/// Shared state of the fake TNC: bytes waiting to be read plus counters.
#[derive(Default)]
struct FakeDevice {
    feed: Mutex<VecDeque<Result<Vec<u8>, TransportError>>>,
    opens: AtomicUsize,
    closes: AtomicUsize,
    refuse_open: AtomicBool,
    /// Simulates a driver that ignores the read timeout
    hang_reads: AtomicBool,
}

impl FakeDevice {
    fn send(&self, bytes: &[u8]) {
        self.feed.lock().unwrap().push_back(Ok(bytes.to_vec()));
    }

    fn fail_next_read(&self) {
        self.feed
            .lock()
            .unwrap()
            .push_back(Err(TransportError::Io("device unplugged".into())));
    }
}

struct FakeOpener(Arc<FakeDevice>);

impl DeviceOpener for FakeOpener {
    type Stream = FakeStream;

    fn open(&self) -> Result<FakeStream, TransportError> {
        if self.0.refuse_open.load(Ordering::Acquire) {
            return Err(TransportError::ConnectionFailed("Permission denied".into()));
        }
        self.0.opens.fetch_add(1, Ordering::AcqRel);
        Ok(FakeStream {
            device: self.0.clone(),
            current: Vec::new(),
        })
    }

    fn describe(&self) -> String {
        "/dev/fake-tnc @ 9600".into()
    }
}

struct FakeStream {
    device: Arc<FakeDevice>,
    current: Vec<u8>,
}

impl ByteStream for FakeStream {
    fn read_available(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        if self.device.hang_reads.load(Ordering::Acquire) {
            std::thread::sleep(Duration::from_millis(300));
            return Ok(Vec::new());
        }
        if self.current.is_empty() {
            let next = self.device.feed.lock().unwrap().pop_front();
            match next {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(e)) => return Err(e),
                None => {
                    // Read timeout
                    std::thread::sleep(Duration::from_millis(2));
                    return Ok(Vec::new());
                }
            }
        }
        let n = max_len.min(self.current.len());
        Ok(self.current.drain(..n).collect())
    }

    fn pending_byte_count(&mut self) -> Result<usize, TransportError> {
        Ok(self.current.len())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.device.closes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Post {
    channel_id: String,
    timestamp_secs: u64,
    frame: Vec<u8>,
}

struct RecordingUploader {
    posts: Vec<Post>,
    destination: Destination,
    fail: bool,
}

impl RecordingUploader {
    fn new() -> Self {
        Self {
            posts: Vec::new(),
            destination: Destination::new("unset", 0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }
}

impl FrameUploader for RecordingUploader {
    fn post_frame(
        &mut self,
        channel_id: &str,
        timestamp_secs: u64,
        frame: &[u8],
    ) -> Result<(), DeliveryStatus> {
        self.posts.push(Post {
            channel_id: channel_id.to_string(),
            timestamp_secs,
            frame: frame.to_vec(),
        });
        if self.fail {
            Err(DeliveryStatus::new(503, "Service Unavailable"))
        } else {
            Ok(())
        }
    }

    fn destination(&self) -> Destination {
        self.destination.clone()
    }

    fn set_destination(&mut self, destination: Destination) {
        self.destination = destination;
    }
}

fn create_test_tnc(
    uploader: RecordingUploader,
) -> (SerialTnc<FakeOpener, RecordingUploader>, Arc<FakeDevice>) {
    let device = Arc::new(FakeDevice::default());
    let tnc = SerialTnc::new(FakeOpener(device.clone()), uploader);
    (tnc, device)
}

fn collect_frames(
    tnc: &SerialTnc<FakeOpener, RecordingUploader>,
    expected: usize,
) -> Vec<Frame> {
    let mut frames = Vec::new();
    wait_until(WAIT, POLL, || {
        frames.extend(tnc.latest_frames().unwrap_or_default());
        frames.len() >= expected
    });
    frames
}

fn post_count(tnc: &SerialTnc<FakeOpener, RecordingUploader>) -> usize {
    tnc.uploader().lock().unwrap().posts.len()
}

#[test]
fn test_initial_state() {
    let (tnc, device) = create_test_tnc(RecordingUploader::new());
    assert_eq!(tnc.state(), ControllerState::Stopped);
    assert!(!tnc.is_capturing());
    assert!(tnc.latest_frames().is_none());
    assert_eq!(device.opens.load(Ordering::Acquire), 0);
}

#[test]
fn test_verify_opens_and_closes_device() {
    let (tnc, device) = create_test_tnc(RecordingUploader::new());

    tnc.verify().unwrap();

    assert_eq!(device.opens.load(Ordering::Acquire), 1);
    assert_eq!(device.closes.load(Ordering::Acquire), 1);
    assert_eq!(tnc.state(), ControllerState::Stopped);
}

#[test]
fn test_verify_reports_open_failure() {
    let (tnc, device) = create_test_tnc(RecordingUploader::new());
    device.refuse_open.store(true, Ordering::Release);

    match tnc.verify() {
        Err(TncError::DeviceOpen { device, reason }) => {
            assert_eq!(device, "/dev/fake-tnc @ 9600");
            assert!(reason.contains("Permission denied"));
        }
        other => panic!("Expected DeviceOpen, got {:?}", other),
    }
}

#[test]
fn test_start_failure_leaves_controller_stopped() {
    let (mut tnc, device) = create_test_tnc(RecordingUploader::new());
    device.refuse_open.store(true, Ordering::Release);

    let result = tnc.start(None, "sat-1");
    assert!(matches!(result, Err(TncError::DeviceOpen { .. })));
    assert_eq!(tnc.state(), ControllerState::Stopped);

    // Stop after a failed start is a no-op
    tnc.stop().unwrap();
}

#[test]
fn test_capture_without_uploader_collects_frames() {
    let (mut tnc, device) = create_test_tnc(RecordingUploader::new());
    tnc.start(None, "sat-1").unwrap();
    assert_eq!(tnc.state(), ControllerState::Running);

    // Second frame split inside an escape sequence
    device.send(&[0xC0, 0x00, 0x41, 0x42, 0xC0, 0xC0, 0x00, 0x43, 0xDB]);
    device.send(&[0xDD, 0x44, 0xC0]);

    let frames = collect_frames(&tnc, 2);
    assert_eq!(
        frames,
        vec![
            Frame::new(vec![0x41, 0x42]),
            Frame::new(vec![0x43, 0xDB, 0x44])
        ]
    );

    // Drained: nothing new until more bytes arrive
    assert_eq!(tnc.latest_frames(), Some(Vec::new()));
    assert_eq!(post_count(&tnc), 0);

    tnc.stop().unwrap();
    assert_eq!(tnc.state(), ControllerState::Stopped);
    assert_eq!(device.closes.load(Ordering::Acquire), 1);
    assert!(tnc.latest_frames().is_none());
}

#[test]
fn test_keepalive_frames_are_not_collected() {
    let (mut tnc, device) = create_test_tnc(RecordingUploader::new());
    tnc.start(None, "sat-1").unwrap();

    device.send(&[0xC0, 0x00, 0xC0, 0xC0, 0xC0, 0xC0, 0x00, 0x01, 0xC0]);

    let frames = collect_frames(&tnc, 1);
    assert_eq!(frames, vec![Frame::new(vec![0x01])]);
    tnc.stop().unwrap();
}

#[test]
fn test_cannot_start_twice() {
    let (mut tnc, device) = create_test_tnc(RecordingUploader::new());
    tnc.start(None, "sat-1").unwrap();

    let result = tnc.start(None, "sat-2");
    assert_eq!(result, Err(TncError::AlreadyRunning));
    assert_eq!(device.opens.load(Ordering::Acquire), 1);
    assert_eq!(tnc.state(), ControllerState::Running);

    tnc.stop().unwrap();
}

#[test]
fn test_stop_when_already_stopped_is_idempotent() {
    let (mut tnc, device) = create_test_tnc(RecordingUploader::new());

    assert!(tnc.stop().is_ok());
    assert!(tnc.stop().is_ok());
    assert_eq!(device.opens.load(Ordering::Acquire), 0);
    assert_eq!(device.closes.load(Ordering::Acquire), 0);
}

#[test]
fn test_frames_posted_to_destination() {
    let (mut tnc, device) = create_test_tnc(RecordingUploader::new());
    tnc.start(Some(Destination::new("api.example.org", 5050)), "sat-42")
        .unwrap();
    assert_eq!(
        tnc.uploader().lock().unwrap().destination(),
        Destination::new("api.example.org", 5050)
    );

    device.send(&[0xC0, 0x00, 0x01, 0xC0, 0xC0, 0x00, 0x02, 0xC0]);
    assert!(wait_until(WAIT, POLL, || post_count(&tnc) == 2));

    {
        let uploader = tnc.uploader();
        let posts = &uploader.lock().unwrap().posts;
        assert_eq!(posts[0].channel_id, "sat-42");
        assert_eq!(posts[0].frame, vec![0x01]);
        assert_eq!(posts[1].frame, vec![0x02]);
        // Decoded in the same read cycle
        assert_eq!(posts[0].timestamp_secs, posts[1].timestamp_secs);
    }

    // Delivered frames are not also kept for polling
    assert_eq!(tnc.latest_frames(), Some(Vec::new()));
    tnc.stop().unwrap();
}

#[test]
fn test_failing_uploader_gets_every_frame() {
    const FRAMES: usize = 25;

    let (mut tnc, device) = create_test_tnc(RecordingUploader::failing());
    tnc.start(Some(Destination::new("localhost", 5050)), "sat-1")
        .unwrap();

    for i in 0..FRAMES {
        device.send(&[0xC0, 0x00, i as u8, 0xC0]);
    }

    assert!(wait_until(WAIT, POLL, || post_count(&tnc) == FRAMES));
    assert!(tnc.is_capturing());

    let uploader = tnc.uploader();
    let frames: Vec<u8> = uploader
        .lock()
        .unwrap()
        .posts
        .iter()
        .map(|p| p.frame[0])
        .collect();
    assert_eq!(frames, (0..FRAMES as u8).collect::<Vec<_>>());

    tnc.stop().unwrap();
}

#[test]
fn test_restart_reuses_uploader() {
    let (mut tnc, device) = create_test_tnc(RecordingUploader::new());

    tnc.start(Some(Destination::new("first.example.org", 1)), "sat-1")
        .unwrap();
    device.send(&[0xC0, 0x00, 0x01, 0xC0]);
    assert!(wait_until(WAIT, POLL, || post_count(&tnc) == 1));
    tnc.stop().unwrap();

    // Capture-only run in between: nothing posted
    tnc.start(None, "sat-1").unwrap();
    device.send(&[0xC0, 0x00, 0x02, 0xC0]);
    assert_eq!(collect_frames(&tnc, 1), vec![Frame::new(vec![0x02])]);
    tnc.stop().unwrap();

    tnc.start(Some(Destination::new("second.example.org", 2)), "sat-1")
        .unwrap();
    device.send(&[0xC0, 0x00, 0x03, 0xC0]);
    assert!(wait_until(WAIT, POLL, || post_count(&tnc) == 2));
    tnc.stop().unwrap();

    assert_eq!(device.opens.load(Ordering::Acquire), 3);
    assert_eq!(device.closes.load(Ordering::Acquire), 3);
    assert_eq!(
        tnc.uploader().lock().unwrap().destination(),
        Destination::new("second.example.org", 2)
    );
}

#[test]
fn test_read_error_ends_capture_until_stopped() {
    let (mut tnc, device) = create_test_tnc(RecordingUploader::new());
    tnc.start(None, "sat-1").unwrap();

    device.send(&[0xC0, 0x00, 0x07, 0xC0]);
    device.fail_next_read();

    assert!(wait_until(WAIT, POLL, || !tnc.is_capturing()));
    assert_eq!(tnc.state(), ControllerState::Running);
    assert_eq!(device.closes.load(Ordering::Acquire), 1);

    // Frames decoded before the failure are still available
    assert_eq!(tnc.latest_frames(), Some(vec![Frame::new(vec![0x07])]));

    tnc.stop().unwrap();
    assert_eq!(tnc.state(), ControllerState::Stopped);
}

#[test]
fn test_stuck_capture_thread_reported_on_stop() {
    let (tnc, device) = create_test_tnc(RecordingUploader::new());
    let mut tnc = tnc.with_supervision(SupervisionConfig {
        stop_timeout_ms: 50,
        poll_interval_ms: 5,
    });
    device.hang_reads.store(true, Ordering::Release);

    tnc.start(None, "sat-1").unwrap();
    // Let the loop enter its hanging read
    std::thread::sleep(Duration::from_millis(20));

    let err = tnc.stop().unwrap_err();
    assert!(err.is_stop_timeout());
    // The session reference is cleared anyway
    assert_eq!(tnc.state(), ControllerState::Stopped);
    assert!(tnc.latest_frames().is_none());

    // The detached thread still closes the device once its read returns
    assert!(wait_until(WAIT, POLL, || device
        .closes
        .load(Ordering::Acquire)
        == 1));
}

#[test]
fn test_frame_limit_drops_oldest() {
    let (tnc, device) = create_test_tnc(RecordingUploader::new());
    let mut tnc = tnc.with_frame_limit(Some(2));
    tnc.start(None, "sat-1").unwrap();

    device.send(&[
        0xC0, 0x00, 0x01, 0xC0, 0xC0, 0x00, 0x02, 0xC0, 0xC0, 0x00, 0x03, 0xC0,
    ]);
    // All three frames complete in one read cycle
    assert!(wait_until(WAIT, POLL, || device.feed.lock().unwrap().is_empty()));
    std::thread::sleep(Duration::from_millis(50));

    assert_eq!(
        tnc.latest_frames(),
        Some(vec![Frame::new(vec![0x02]), Frame::new(vec![0x03])])
    );
    assert_eq!(tnc.dropped_frames(), Some(1));

    tnc.stop().unwrap();
    assert_eq!(tnc.dropped_frames(), None);
}

#[test]
fn test_drop_stops_running_capture() {
    let (mut tnc, device) = create_test_tnc(RecordingUploader::new());
    tnc.start(None, "sat-1").unwrap();
    drop(tnc);

    assert_eq!(device.closes.load(Ordering::Acquire), 1);
}

#[test]
fn test_drop_with_stuck_capture_returns() {
    let (tnc, device) = create_test_tnc(RecordingUploader::new());
    let mut tnc = tnc.with_supervision(SupervisionConfig {
        stop_timeout_ms: 50,
        poll_interval_ms: 5,
    });
    device.hang_reads.store(true, Ordering::Release);
    tnc.start(None, "sat-1").unwrap();
    std::thread::sleep(Duration::from_millis(20));

    let started = std::time::Instant::now();
    drop(tnc);
    assert!(started.elapsed() < Duration::from_millis(250));

    assert!(wait_until(WAIT, POLL, || device
        .closes
        .load(Ordering::Acquire)
        == 1));
}
