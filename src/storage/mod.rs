pub mod header;
pub mod recorder;
pub mod storage_error;
pub mod wav_reader;
pub mod wav_writer;

pub use header::WavHeader;
pub use recorder::{DebugRecorder, RecorderOptions, RecorderStats, run_recording_dir};
pub use storage_error::StorageError;
pub use wav_reader::{ChunkIterator, WavReader};
pub use wav_writer::MmapWavWriter;
