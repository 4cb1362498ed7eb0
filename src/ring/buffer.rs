use super::RingError;

/// Fixed-capacity circular byte buffer that keeps the most recent bytes.
///
/// Not thread safe: `put` takes `&mut self`, so one task owns the buffer for
/// the lifetime of a streaming session.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    buf: Box<[u8]>,
    pos: usize,
    len: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        if capacity == 0 {
            return Err(RingError::InvalidCapacity {
                capacity,
                reason: "must be greater than zero",
            });
        }

        Ok(Self {
            buf: vec![0; capacity].into_boxed_slice(),
            pos: 0,
            len: 0,
        })
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Write cursor: index of the next byte to be written.
    #[inline(always)]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.pos = 0;
        self.len = 0;
    }

    #[inline]
    pub fn put(&mut self, data: &[u8]) {
        let capacity = self.capacity();
        let total = data.len();

        // Only the tail that fits can survive; the write cursor still
        // advances by the full length.
        let data = &data[total.saturating_sub(capacity)..];
        let start = (self.pos + (total - data.len())) % capacity;
        let new_end = start + data.len();

        if new_end < capacity {
            self.buf[start..new_end].copy_from_slice(data);
        } else {
            let first_chunk = capacity - start;
            self.buf[start..].copy_from_slice(&data[..first_chunk]);
            self.buf[..new_end - capacity].copy_from_slice(&data[first_chunk..]);
        }

        self.pos = new_end % capacity;
        self.len = capacity.min(self.len + total);
    }

    /// Returns the stored bytes, oldest first.
    #[inline]
    pub fn get_value(&self) -> Vec<u8> {
        if self.pos >= self.len {
            return self.buf[self.pos - self.len..self.pos].to_vec();
        }

        let tail_start = self.capacity() - (self.len - self.pos);
        let mut value = Vec::with_capacity(self.len);
        value.extend_from_slice(&self.buf[tail_start..]);
        value.extend_from_slice(&self.buf[..self.pos]);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_put_keeps_cursor_in_step() {
        let mut ring = RingBuffer::new(4).unwrap();
        ring.put(&[1]);
        ring.put(&[2, 3, 4, 5, 6, 7, 8, 9, 10]);

        assert_eq!(ring.pos(), 2);
        assert_eq!(ring.get_value(), vec![7, 8, 9, 10]);
    }

    #[test]
    fn exact_fill_wraps_cursor_to_zero() {
        let mut ring = RingBuffer::new(4).unwrap();
        ring.put(&[1, 2, 3, 4]);

        assert_eq!(ring.pos(), 0);
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.get_value(), vec![1, 2, 3, 4]);
    }
}
