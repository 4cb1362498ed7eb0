use super::{StorageError, WavHeader};
use crate::audio::{AudioChunk, BYTES_PER_CHUNK, MS_PER_CHUNK, SAMPLE_RATE};
use memmap2::{Advice, Mmap};
use std::fs::File;
use std::io;
use std::path::Path;

/// Read-only view over a recorded WAV file.
pub struct WavReader {
    mmap: Mmap,
    header: WavHeader,
}

impl WavReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len() as usize;

        if len < WavHeader::SIZE {
            return Err(StorageError::FileTooSmall { len });
        }

        // The mapping is private to this reader and the file is not resized
        // while it is open.
        let mmap = unsafe { Mmap::map(&file)? };
        let header = WavHeader::parse(&mmap)?;

        Ok(Self { mmap, header })
    }

    #[inline]
    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    /// PCM payload. Clamped to the mapped length if the header claims more.
    #[inline]
    pub fn samples(&self) -> &[u8] {
        let end = (WavHeader::SIZE + self.header.data_len()).min(self.mmap.len());
        &self.mmap[WavHeader::SIZE..end]
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.samples().len() / self.header.block_align.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / SAMPLE_RATE as f64
    }

    pub fn chunks(&self, bytes_per_chunk: usize) -> ChunkIterator<'_> {
        ChunkIterator {
            samples: self.samples(),
            bytes_per_chunk: bytes_per_chunk.max(1),
            ms_per_chunk: MS_PER_CHUNK * bytes_per_chunk as u64 / BYTES_PER_CHUNK as u64,
            offset: 0,
        }
    }

    pub fn advise_sequential(&self) -> io::Result<()> {
        self.mmap.advise(Advice::Sequential)
    }
}

pub struct ChunkIterator<'a> {
    samples: &'a [u8],
    bytes_per_chunk: usize,
    ms_per_chunk: u64,
    offset: usize,
}

impl Iterator for ChunkIterator<'_> {
    type Item = AudioChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.samples.len() {
            return None;
        }

        let end = (self.offset + self.bytes_per_chunk).min(self.samples.len());
        let index = (self.offset / self.bytes_per_chunk) as u64;
        let chunk = AudioChunk::new(
            self.samples[self.offset..end].to_vec(),
            index * self.ms_per_chunk,
        );
        self.offset = end;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.samples.len() - self.offset).div_ceil(self.bytes_per_chunk);
        (remaining, Some(remaining))
    }
}
