use crate::audio::AudioChunk;
pub mod dispatcher;
pub mod frame;

/// A sink for captured audio chunks (debug recorder, device listeners).
pub trait ChunkConsumer: Send {
    fn consume(&mut self, chunk: &AudioChunk) -> bool;

    fn flush(&mut self) {}

    fn name(&self) -> &str;
}
