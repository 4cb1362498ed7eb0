use crate::ring::RingError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("File too small for WAV header: {len} bytes")]
    FileTooSmall { len: usize },
    #[error("Invalid WAV header: {0}")]
    InvalidHeader(&'static str),
    #[error("Capture queue error: {0}")]
    Queue(#[from] RingError),
    #[error("Recorder thread has already stopped")]
    RecorderStopped,
    #[error("Recorder thread panicked")]
    RecorderPanicked,
}
