use thiserror::Error;

#[derive(Debug, Error)]
pub enum RingError {
    #[error("Not enough space in ring buffer: required {required} bytes, available {available} bytes")]
    NotEnoughSpace { required: usize, available: usize },
    #[error("Invalid capacity {capacity}: {reason}")]
    InvalidCapacity {
        capacity: usize,
        reason: &'static str,
    },
    #[error("Payload too large: {payload_len} bytes exceeds maximum of {max_len} bytes")]
    PayloadTooLarge { payload_len: usize, max_len: usize },
}
