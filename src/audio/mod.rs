pub mod chunker;
pub mod prebuffer;
pub mod volume;

pub use chunker::{AudioBuffer, AudioChunker, chunk_samples};
pub use prebuffer::{SttPrebuffer, WakeGate};
pub use volume::multiply_volume;

use thiserror::Error;

/// 16 kHz, 16-bit, mono PCM.
pub const SAMPLE_RATE: u32 = 16_000;
pub const SAMPLE_WIDTH: u16 = 2;
pub const SAMPLE_CHANNELS: u16 = 1;

pub const MS_PER_CHUNK: u64 = 10;
pub const SAMPLES_PER_CHUNK: usize = 160;
pub const BYTES_PER_CHUNK: usize = SAMPLES_PER_CHUNK * SAMPLE_WIDTH as usize;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio buffer overflow: {len} + {incoming} bytes exceeds maximum of {max_len} bytes")]
    BufferOverflow {
        len: usize,
        incoming: usize,
        max_len: usize,
    },
    #[error("Invalid chunk size {0}: must be a positive multiple of the sample width")]
    InvalidChunkSize(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub audio: Vec<u8>,
    /// Milliseconds since the start of the stream.
    pub timestamp_ms: u64,
}

impl AudioChunk {
    pub fn new(audio: Vec<u8>, timestamp_ms: u64) -> Self {
        Self {
            audio,
            timestamp_ms,
        }
    }

    pub fn samples(&self) -> usize {
        self.audio.len() / SAMPLE_WIDTH as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples() as f64 / SAMPLE_RATE as f64
    }
}
