use super::ChunkConsumer;
use crate::audio::AudioChunk;
use tracing::{trace, warn};

pub struct CaptureDispatcher {
    consumers: Vec<Box<dyn ChunkConsumer>>,
}

impl Default for CaptureDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDispatcher {
    pub fn new() -> Self {
        Self {
            consumers: Vec::new(),
        }
    }

    pub fn add_consumer<C: ChunkConsumer + 'static>(&mut self, consumer: C) {
        trace!(consumer = consumer.name(), "adding capture consumer");
        self.consumers.push(Box::new(consumer));
    }

    pub fn consumer_names(&self) -> Vec<&str> {
        self.consumers.iter().map(|c| c.name()).collect()
    }

    #[inline]
    pub fn dispatch(&mut self, chunk: &AudioChunk) -> CaptureStats {
        let mut stats = CaptureStats {
            chunks_seen: 1,
            ..Default::default()
        };
        for consumer in &mut self.consumers {
            if consumer.consume(chunk) {
                stats.chunks_delivered += 1;
            } else {
                warn!(
                    consumer = consumer.name(),
                    timestamp_ms = chunk.timestamp_ms,
                    "capture consumer rejected chunk"
                );
                stats.chunks_failed += 1;
            }
        }
        stats
    }

    /// Dispatches every chunk, then flushes all consumers.
    #[inline]
    pub fn dispatch_all<'a, I>(&mut self, chunks: I) -> CaptureStats
    where
        I: IntoIterator<Item = &'a AudioChunk>,
    {
        let mut stats = CaptureStats::default();
        for chunk in chunks {
            stats.merge(self.dispatch(chunk));
        }
        self.flush();
        stats
    }

    #[inline]
    pub fn dispatch_batch<'a, I>(&mut self, chunks: I, limit: usize) -> CaptureStats
    where
        I: IntoIterator<Item = &'a AudioChunk>,
    {
        let mut stats = CaptureStats::default();
        for chunk in chunks.into_iter().take(limit) {
            stats.merge(self.dispatch(chunk));
        }
        stats
    }

    pub fn flush(&mut self) {
        for consumer in &mut self.consumers {
            consumer.flush();
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptureStats {
    pub chunks_seen: u64,
    pub chunks_delivered: u64,
    pub chunks_failed: u64,
}

impl CaptureStats {
    #[inline]
    pub fn merge(&mut self, other: CaptureStats) {
        self.chunks_seen += other.chunks_seen;
        self.chunks_delivered += other.chunks_delivered;
        self.chunks_failed += other.chunks_failed;
    }

    #[inline]
    pub fn success_rate(&self) -> f64 {
        let total = self.chunks_delivered + self.chunks_failed;
        if total == 0 {
            1.0
        } else {
            self.chunks_delivered as f64 / total as f64
        }
    }
}
