use super::{AudioChunk, AudioError, BYTES_PER_CHUNK, MS_PER_CHUNK, SAMPLE_WIDTH, multiply_volume};

/// Bounded byte buffer holding audio that did not fill a whole chunk.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    bytes: Vec<u8>,
    max_len: usize,
}

impl AudioBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(max_len),
            max_len,
        }
    }

    pub fn append(&mut self, data: &[u8]) -> Result<(), AudioError> {
        if self.bytes.len() + data.len() > self.max_len {
            return Err(AudioError::BufferOverflow {
                len: self.bytes.len(),
                incoming: data.len(),
                max_len: self.max_len,
            });
        }
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

/// Splits `samples` into `bytes_per_chunk` pieces, carrying any remainder
/// over to the next call through `leftover`.
pub fn chunk_samples(
    samples: &[u8],
    bytes_per_chunk: usize,
    leftover: &mut AudioBuffer,
) -> Result<Vec<Vec<u8>>, AudioError> {
    if bytes_per_chunk == 0 {
        return Err(AudioError::InvalidChunkSize(bytes_per_chunk));
    }

    if leftover.len() + samples.len() < bytes_per_chunk {
        leftover.append(samples)?;
        return Ok(Vec::new());
    }

    let mut chunks = Vec::with_capacity((leftover.len() + samples.len()) / bytes_per_chunk);
    let mut rest = samples;

    if !leftover.is_empty() {
        let (head, tail) = rest.split_at(bytes_per_chunk - leftover.len());
        leftover.append(head)?;
        chunks.push(leftover.bytes().to_vec());
        leftover.clear();
        rest = tail;
    }

    let mut full = rest.chunks_exact(bytes_per_chunk);
    chunks.extend(full.by_ref().map(<[u8]>::to_vec));
    leftover.append(full.remainder())?;

    Ok(chunks)
}

/// Turns a stream of arbitrarily sized PCM reads into fixed-size,
/// timestamped chunks.
#[derive(Debug, Clone)]
pub struct AudioChunker {
    bytes_per_chunk: usize,
    ms_per_chunk: u64,
    volume_multiplier: f32,
    leftover: AudioBuffer,
    next_timestamp_ms: u64,
}

impl AudioChunker {
    pub fn new(bytes_per_chunk: usize, volume_multiplier: f32) -> Result<Self, AudioError> {
        if bytes_per_chunk == 0 || bytes_per_chunk % SAMPLE_WIDTH as usize != 0 {
            return Err(AudioError::InvalidChunkSize(bytes_per_chunk));
        }

        Ok(Self {
            bytes_per_chunk,
            ms_per_chunk: MS_PER_CHUNK * bytes_per_chunk as u64 / BYTES_PER_CHUNK as u64,
            volume_multiplier,
            leftover: AudioBuffer::new(bytes_per_chunk),
            next_timestamp_ms: 0,
        })
    }

    pub fn bytes_per_chunk(&self) -> usize {
        self.bytes_per_chunk
    }

    pub fn next_timestamp_ms(&self) -> u64 {
        self.next_timestamp_ms
    }

    pub fn pending(&self) -> usize {
        self.leftover.len()
    }

    pub fn process(&mut self, samples: &[u8]) -> Result<Vec<AudioChunk>, AudioError> {
        let chunks = chunk_samples(samples, self.bytes_per_chunk, &mut self.leftover)?;

        Ok(chunks
            .into_iter()
            .map(|audio| self.stamp(audio))
            .collect())
    }

    /// Emits whatever partial chunk is still buffered.
    pub fn finish(&mut self) -> Option<AudioChunk> {
        if self.leftover.is_empty() {
            return None;
        }
        let audio = self.leftover.bytes().to_vec();
        self.leftover.clear();
        Some(self.stamp(audio))
    }

    // Scaling happens after chunking so odd-sized reads never split a sample.
    fn stamp(&mut self, audio: Vec<u8>) -> AudioChunk {
        let audio = if self.volume_multiplier != 1.0 {
            multiply_volume(&audio, self.volume_multiplier)
        } else {
            audio
        };
        let chunk = AudioChunk::new(audio, self.next_timestamp_ms);
        self.next_timestamp_ms += self.ms_per_chunk;
        chunk
    }
}
