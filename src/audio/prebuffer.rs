use super::{AudioChunk, BYTES_PER_CHUNK, MS_PER_CHUNK, SAMPLE_RATE, SAMPLES_PER_CHUNK};
use crate::ring::{RingBuffer, RingError};
use tracing::info;

/// Audio kept from right before a wake word is detected, so the start of the
/// voice command can still be forwarded to speech-to-text.
#[derive(Debug, Clone)]
pub struct SttPrebuffer {
    ring: RingBuffer,
}

impl SttPrebuffer {
    /// Returns `None` when `seconds` covers less than one whole chunk.
    pub fn new(seconds: f64) -> Result<Option<Self>, RingError> {
        // Saturating cast: negative and NaN durations disable buffering.
        let num_chunks = (seconds * SAMPLE_RATE as f64 / SAMPLES_PER_CHUNK as f64) as usize;
        if num_chunks == 0 {
            return Ok(None);
        }

        let capacity = num_chunks
            .checked_mul(BYTES_PER_CHUNK)
            .ok_or(RingError::InvalidCapacity {
                capacity: usize::MAX,
                reason: "buffered audio duration is too long",
            })?;

        Ok(Some(Self {
            ring: RingBuffer::new(capacity)?,
        }))
    }

    pub fn push(&mut self, chunk: &AudioChunk) {
        self.ring.put(&chunk.audio);
    }

    /// Drains the buffered audio, oldest first.
    pub fn take(&mut self) -> Vec<u8> {
        let audio = self.ring.get_value();
        self.ring.clear();
        audio
    }

    /// Drains the buffered audio as whole chunks, the last one ending at
    /// `end_timestamp_ms`.
    pub fn drain_chunks(&mut self, end_timestamp_ms: u64) -> Vec<AudioChunk> {
        let audio = self.take();
        let count = audio.len().div_ceil(BYTES_PER_CHUNK) as u64;
        let start_ms = end_timestamp_ms.saturating_sub(count * MS_PER_CHUNK);

        audio
            .chunks(BYTES_PER_CHUNK)
            .zip(0u64..)
            .map(|(chunk, i)| AudioChunk::new(chunk.to_vec(), start_ms + i * MS_PER_CHUNK))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

/// Holds chunks back until the wake time, keeping the most recent ones in an
/// optional pre-buffer. Once the wake time is reached the buffered audio is
/// released ahead of the live chunks.
#[derive(Debug)]
pub struct WakeGate {
    wake_at_ms: Option<u64>,
    prebuffer: Option<SttPrebuffer>,
}

impl WakeGate {
    /// `None` opens the gate immediately.
    pub fn new(wake_at_ms: Option<u64>, prebuffer: Option<SttPrebuffer>) -> Self {
        Self {
            wake_at_ms,
            prebuffer,
        }
    }

    pub fn is_open(&self) -> bool {
        self.wake_at_ms.is_none()
    }

    pub fn prebuffer(&self) -> Option<&SttPrebuffer> {
        self.prebuffer.as_ref()
    }

    pub fn pass(&mut self, chunks: Vec<AudioChunk>) -> Vec<AudioChunk> {
        let Some(wake_at_ms) = self.wake_at_ms else {
            return chunks;
        };

        let mut released = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if self.wake_at_ms.is_some() {
                if chunk.timestamp_ms < wake_at_ms {
                    if let Some(prebuffer) = self.prebuffer.as_mut() {
                        prebuffer.push(&chunk);
                    }
                    continue;
                }

                self.wake_at_ms = None;
                if let Some(prebuffer) = self.prebuffer.as_mut() {
                    released.extend(prebuffer.drain_chunks(chunk.timestamp_ms));
                }
                info!(wake_at_ms, buffered = released.len(), "releasing audio after wake");
            }
            released.push(chunk);
        }
        released
    }
}
