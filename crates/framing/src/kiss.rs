use core_types::Frame;
use std::fmt;

// KISS special characters
pub const FEND: u8 = 0xC0;
pub const FESC: u8 = 0xDB;
pub const TFEND: u8 = 0xDC;
pub const TFESC: u8 = 0xDD;

/// Data-type byte of a regular data frame on TNC port 0.
const DATA_FRAME: u8 = 0x00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Waiting for a frame to start.
    Idle,
    /// Inside a frame.
    InFrame,
    /// Previous byte was FESC.
    Escaped,
}

/// Recoverable irregularities seen while decoding. Logged, never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeAnomaly {
    /// Frame completed with a data-type byte other than 0x00. The frame is kept.
    UnknownDataType(u8),
    /// FESC followed by something other than TFEND/TFESC. The byte is dropped.
    InvalidEscape(u8),
}

impl fmt::Display for DecodeAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownDataType(b) => {
                write!(f, "Received unknown KISS frame data type from TNC: {:x}", b)
            }
            Self::InvalidEscape(b) => {
                write!(f, "Received invalid KISS escape char from TNC: {:x}", b)
            }
        }
    }
}

/// Extracts KISS frames from an arbitrarily chunked byte stream.
///
/// Bytes may arrive split anywhere, including between FESC and its
/// transposed character; state carries over between `write` calls.
/// Completed frames queue up until `read_frames` drains them.
///
/// Not synchronized. Confine each decoder to the thread that feeds it.
pub struct KissDecoder {
    state: DecoderState,
    buffer: Vec<u8>,
    frames: Vec<Frame>,
    anomalies: u64,
}

impl KissDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Idle,
            buffer: Vec::with_capacity(256),
            frames: Vec::new(),
            anomalies: 0,
        }
    }

    /// Feed bytes through the state machine in order. Never fails.
    pub fn write(&mut self, data: &[u8]) {
        for &b in data {
            self.write_byte(b);
        }
    }

    /// Take every frame completed so far, oldest first.
    pub fn read_frames(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.frames)
    }

    /// Number of frames waiting to be read.
    pub fn queued(&self) -> usize {
        self.frames.len()
    }

    /// Bytes accumulated for the frame currently being received.
    pub fn pending_len(&self) -> usize {
        match self.state {
            DecoderState::Idle => 0,
            DecoderState::InFrame | DecoderState::Escaped => self.buffer.len(),
        }
    }

    /// Total anomalies seen since construction.
    pub fn anomaly_count(&self) -> u64 {
        self.anomalies
    }

    fn write_byte(&mut self, b: u8) {
        self.state = match self.state {
            DecoderState::Idle => {
                if b == FEND {
                    self.buffer.clear();
                    DecoderState::InFrame
                } else {
                    DecoderState::Idle
                }
            }
            DecoderState::InFrame => match b {
                FEND => {
                    self.finish_frame();
                    DecoderState::Idle
                }
                FESC => DecoderState::Escaped,
                _ => {
                    self.buffer.push(b);
                    DecoderState::InFrame
                }
            },
            DecoderState::Escaped => {
                match b {
                    TFEND => self.buffer.push(FEND),
                    TFESC => self.buffer.push(FESC),
                    _ => self.record(DecodeAnomaly::InvalidEscape(b)),
                }
                DecoderState::InFrame
            }
        };
    }

    fn finish_frame(&mut self) {
        // A lone data-type byte (or nothing) is a keep-alive, not a frame.
        if self.buffer.len() > 1 {
            if let Some((&data_type, payload)) = self.buffer.split_first() {
                let frame = Frame::new(payload.to_vec());
                if data_type != DATA_FRAME {
                    self.record(DecodeAnomaly::UnknownDataType(data_type));
                }
                self.frames.push(frame);
            }
        }
        self.buffer.clear();
    }

    fn record(&mut self, anomaly: DecodeAnomaly) {
        self.anomalies += 1;
        log::info!("{}", anomaly);
    }
}

impl Default for KissDecoder {
    fn default() -> Self {
        Self::new()
    }
}
