use super::{MmapWavWriter, StorageError};
use crate::audio::AudioChunk;
use crate::capture::ChunkConsumer;
use crate::capture::frame::FrameKind;
use crate::ring::{Consumer, Producer, RingError, SpscRingBuffer};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct RecorderOptions {
    /// Size of the capture queue between the audio task and the recorder.
    pub queue_capacity: usize,
    /// Bytes preallocated per WAV file. A full file is remapped at twice
    /// its size, up to the 4 GiB WAV limit.
    pub file_capacity: usize,
    /// The recorder stops when no frame arrives for this long.
    pub message_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 1 << 20,
            file_capacity: 16 * 1024 * 1024,
            message_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(1),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecorderStats {
    pub files_written: u64,
    pub bytes_written: u64,
    pub frames_dropped: u64,
}

/// `<base>/<pipeline>/<run>` or `<base>/<device>/<pipeline>/<run>`.
pub fn run_recording_dir(
    base: &Path,
    device_id: Option<&str>,
    pipeline_name: &str,
    run_id: &str,
) -> PathBuf {
    let mut dir = base.to_path_buf();
    if let Some(device_id) = device_id {
        dir.push(device_id);
    }
    dir.push(pipeline_name);
    dir.push(run_id);
    dir
}

/// Records captured wake word / speech-to-text audio to WAV files on a
/// background thread.
pub struct DebugRecorder {
    producer: Producer,
    thread: Option<JoinHandle<RecorderStats>>,
    dir: PathBuf,
    frames_dropped: u64,
}

impl DebugRecorder {
    pub fn spawn(dir: impl Into<PathBuf>, options: RecorderOptions) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let (producer, consumer) = SpscRingBuffer::new(options.queue_capacity)?.split();

        info!(dir = %dir.display(), "saving wake/stt audio");
        let thread_dir = dir.clone();
        let thread = thread::Builder::new()
            .name("debug-recorder".into())
            .spawn(move || record_frames(&thread_dir, consumer, &options))?;

        Ok(Self {
            producer,
            thread: Some(thread),
            dir,
            frames_dropped: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Closes the current file and starts `<dir>/<name>.wav`.
    pub fn start_recording(&mut self, name: &str) -> Result<(), StorageError> {
        if self.send_control(FrameKind::Start, name.as_bytes())? {
            Ok(())
        } else {
            Err(StorageError::RecorderStopped)
        }
    }

    /// Queues a chunk for the current recording. Returns false when the
    /// chunk was dropped.
    pub fn capture(&mut self, chunk: &AudioChunk) -> bool {
        if !self.is_running() {
            self.frames_dropped += 1;
            return false;
        }

        if let Err(e) = self
            .producer
            .write_frame(FrameKind::Audio, chunk.timestamp_ms, &chunk.audio)
        {
            debug!(timestamp_ms = chunk.timestamp_ms, "dropping captured audio: {}", e);
            self.frames_dropped += 1;
            return false;
        }

        self.confirm_delivery()
    }

    /// The thread may time out between the running check and the write. It
    /// only exits on an empty queue, so anything still queued once it has
    /// finished is the frame just written.
    fn confirm_delivery(&mut self) -> bool {
        if !self.is_running() && self.producer.pending() > 0 {
            debug!("recorder stopped before reading captured audio");
            self.frames_dropped += 1;
            return false;
        }
        true
    }

    pub fn stop(mut self) -> Result<RecorderStats, StorageError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<RecorderStats, StorageError> {
        let mut stats = RecorderStats::default();

        if self.thread.is_some() {
            self.send_control(FrameKind::Stop, &[])?;
        }
        if let Some(thread) = self.thread.take() {
            stats = thread.join().map_err(|_| StorageError::RecorderPanicked)?;
        }
        stats.frames_dropped += std::mem::take(&mut self.frames_dropped);

        info!(
            files = stats.files_written,
            bytes = stats.bytes_written,
            dropped = stats.frames_dropped,
            "debug recording finished"
        );
        Ok(stats)
    }

    /// Control frames must not be lost, so wait for queue space. Returns
    /// false when the recorder thread has already exited.
    fn send_control(&mut self, kind: FrameKind, payload: &[u8]) -> Result<bool, StorageError> {
        loop {
            if !self.is_running() {
                return Ok(false);
            }
            match self.producer.write_frame(kind, 0, payload) {
                Ok(()) => return Ok(true),
                Err(RingError::NotEnoughSpace { .. }) => thread::sleep(Duration::from_millis(1)),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl ChunkConsumer for DebugRecorder {
    fn consume(&mut self, chunk: &AudioChunk) -> bool {
        self.capture(chunk)
    }

    fn name(&self) -> &str {
        "debug_recording"
    }
}

impl Drop for DebugRecorder {
    fn drop(&mut self) {
        if self.thread.is_some() {
            if let Err(e) = self.shutdown() {
                error!("failed to stop debug recorder: {}", e);
            }
        }
    }
}

fn record_frames(dir: &Path, mut consumer: Consumer, options: &RecorderOptions) -> RecorderStats {
    let mut stats = RecorderStats::default();
    let mut writer: Option<MmapWavWriter> = None;
    let mut last_frame = Instant::now();

    loop {
        let Some((header, payload)) = consumer.read_frame() else {
            if last_frame.elapsed() >= options.message_timeout {
                // Happens when the pipeline fails without sending Stop.
                warn!(timeout = ?options.message_timeout, "no captured audio, stopping recorder");
                break;
            }
            thread::sleep(options.poll_interval);
            continue;
        };
        last_frame = Instant::now();

        match header.kind() {
            Some(FrameKind::Start) => {
                writer = None;
                let path = dir.join(format!("{}.wav", file_stem(&payload)));
                match MmapWavWriter::create(&path, options.file_capacity) {
                    Ok(w) => {
                        debug!(path = %path.display(), "new recording");
                        stats.files_written += 1;
                        writer = Some(w);
                    }
                    Err(e) => error!(path = %path.display(), "failed to create recording: {}", e),
                }
            }
            Some(FrameKind::Audio) => match writer.as_mut() {
                Some(w) => {
                    if append_growing(w, &payload) {
                        stats.bytes_written += payload.len() as u64;
                    } else {
                        warn!("recording reached the WAV size limit, dropping audio");
                        stats.frames_dropped += 1;
                    }
                }
                None => stats.frames_dropped += 1,
            },
            Some(FrameKind::Stop) => break,
            None => warn!(kind = header.kind, "unknown capture frame"),
        }
    }

    stats
}

fn append_growing(writer: &mut MmapWavWriter, audio: &[u8]) -> bool {
    if writer.write_frames(audio) {
        return true;
    }

    let capacity = writer
        .capacity()
        .saturating_mul(2)
        .max(writer.capacity().saturating_add(audio.len()));
    match writer.grow(capacity) {
        Ok(true) => writer.write_frames(audio),
        Ok(false) => false,
        Err(e) => {
            error!("failed to grow recording: {}", e);
            false
        }
    }
}

fn file_stem(name: &[u8]) -> String {
    String::from_utf8_lossy(name)
        .chars()
        .map(|c| if std::path::is_separator(c) { '_' } else { c })
        .collect()
}
