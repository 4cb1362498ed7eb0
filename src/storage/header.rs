use super::StorageError;
use crate::audio::{SAMPLE_CHANNELS, SAMPLE_RATE, SAMPLE_WIDTH};

/// Canonical 44-byte RIFF/WAVE header for the pipeline's PCM format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_size: u32,
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl Default for WavHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl WavHeader {
    pub const SIZE: usize = 44;
    pub const PCM_FORMAT: u16 = 1;

    const FMT_CHUNK_SIZE: u32 = 16;

    pub fn new() -> Self {
        let block_align = SAMPLE_CHANNELS * SAMPLE_WIDTH;
        Self {
            riff_size: Self::SIZE as u32 - 8,
            audio_format: Self::PCM_FORMAT,
            channels: SAMPLE_CHANNELS,
            sample_rate: SAMPLE_RATE,
            byte_rate: SAMPLE_RATE * block_align as u32,
            block_align,
            bits_per_sample: SAMPLE_WIDTH * 8,
            data_size: 0,
        }
    }

    pub fn with_data_len(data_len: u32) -> Self {
        let mut header = Self::new();
        header.set_data_len(data_len);
        header
    }

    pub fn set_data_len(&mut self, data_len: u32) {
        self.data_size = data_len;
        self.riff_size = (Self::SIZE as u32 - 8).saturating_add(data_len);
    }

    #[inline]
    pub fn data_len(&self) -> usize {
        self.data_size as usize
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.data_len() / self.block_align.max(1) as usize
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(b"RIFF");
        out[4..8].copy_from_slice(&self.riff_size.to_le_bytes());
        out[8..12].copy_from_slice(b"WAVE");
        out[12..16].copy_from_slice(b"fmt ");
        out[16..20].copy_from_slice(&Self::FMT_CHUNK_SIZE.to_le_bytes());
        out[20..22].copy_from_slice(&self.audio_format.to_le_bytes());
        out[22..24].copy_from_slice(&self.channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        out[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out[36..40].copy_from_slice(b"data");
        out[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        out
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.len() < Self::SIZE {
            return Err(StorageError::FileTooSmall { len: bytes.len() });
        }

        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };

        if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(StorageError::InvalidHeader("missing RIFF/WAVE tags"));
        }
        if &bytes[12..16] != b"fmt " || u32_at(16) != Self::FMT_CHUNK_SIZE {
            return Err(StorageError::InvalidHeader("unexpected fmt chunk"));
        }
        if &bytes[36..40] != b"data" {
            return Err(StorageError::InvalidHeader("missing data chunk"));
        }

        let header = Self {
            riff_size: u32_at(4),
            audio_format: u16_at(20),
            channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_size: u32_at(40),
        };

        if header.audio_format != Self::PCM_FORMAT {
            return Err(StorageError::InvalidHeader("not PCM audio"));
        }
        let expected = Self::new();
        if header.channels != expected.channels
            || header.sample_rate != expected.sample_rate
            || header.bits_per_sample != expected.bits_per_sample
        {
            return Err(StorageError::InvalidHeader(
                "audio is not 16 kHz, 16-bit, mono",
            ));
        }

        Ok(header)
    }
}
