use super::RingError;
use crate::capture::frame::{FrameHeader, FrameKind};
use std::cell::UnsafeCell;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Shared {
    buf: Box<[UnsafeCell<u8>]>,
    capacity: usize,
    mask: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// The producer only writes `[head, tail + capacity)` and the consumer only
// reads `[tail, head)`; the atomics publish each side's progress.
unsafe impl Send for Shared {}
unsafe impl Sync for Shared {}

impl Shared {
    #[inline(always)]
    fn buf_ptr(&self) -> *mut u8 {
        UnsafeCell::raw_get(self.buf.as_ptr())
    }

    /// # Safety
    /// `[offset, offset + src.len())` must be owned by the producer.
    #[inline]
    unsafe fn copy_in(&self, offset: usize, src: &[u8]) {
        let start = offset & self.mask;
        let contiguous = self.capacity - start;
        let buf_ptr = self.buf_ptr();

        unsafe {
            if src.len() <= contiguous {
                ptr::copy_nonoverlapping(src.as_ptr(), buf_ptr.add(start), src.len());
            } else {
                ptr::copy_nonoverlapping(src.as_ptr(), buf_ptr.add(start), contiguous);
                ptr::copy_nonoverlapping(
                    src.as_ptr().add(contiguous),
                    buf_ptr,
                    src.len() - contiguous,
                );
            }
        }
    }

    /// # Safety
    /// `[offset, offset + dst.len())` must have been published by the producer.
    #[inline]
    unsafe fn copy_out(&self, offset: usize, dst: &mut [u8]) {
        let start = offset & self.mask;
        let contiguous = self.capacity - start;
        let buf_ptr = self.buf_ptr();

        unsafe {
            if dst.len() <= contiguous {
                ptr::copy_nonoverlapping(buf_ptr.add(start), dst.as_mut_ptr(), dst.len());
            } else {
                ptr::copy_nonoverlapping(buf_ptr.add(start), dst.as_mut_ptr(), contiguous);
                ptr::copy_nonoverlapping(
                    buf_ptr,
                    dst.as_mut_ptr().add(contiguous),
                    dst.len() - contiguous,
                );
            }
        }
    }
}

/// Lock-free single-producer/single-consumer queue of capture frames.
pub struct SpscRingBuffer {
    shared: Arc<Shared>,
}

impl SpscRingBuffer {
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        if !capacity.is_power_of_two() {
            return Err(RingError::InvalidCapacity {
                capacity,
                reason: "must be a power of two",
            });
        }

        let min_capacity = FrameHeader::SIZE * 4;
        if capacity < min_capacity {
            return Err(RingError::InvalidCapacity {
                capacity,
                reason: "too small, must be at least 4x FrameHeader::SIZE",
            });
        }

        Ok(Self {
            shared: Arc::new(Shared {
                buf: (0..capacity).map(|_| UnsafeCell::new(0)).collect(),
                capacity,
                mask: capacity - 1,
                head: AtomicUsize::new(0),
                tail: AtomicUsize::new(0),
            }),
        })
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn split(self) -> (Producer, Consumer) {
        (
            Producer {
                shared: Arc::clone(&self.shared),
            },
            Consumer {
                shared: self.shared,
            },
        )
    }
}

pub struct Producer {
    shared: Arc<Shared>,
}

pub struct Consumer {
    shared: Arc<Shared>,
}

impl Producer {
    #[inline]
    pub fn available(&self) -> usize {
        let head = self.shared.head.load(Ordering::Relaxed);
        let tail = self.shared.tail.load(Ordering::Acquire);
        self.shared.capacity - head.wrapping_sub(tail) - 1
    }

    /// Bytes written but not yet read by the consumer.
    #[inline]
    pub fn pending(&self) -> usize {
        let head = self.shared.head.load(Ordering::Relaxed);
        let tail = self.shared.tail.load(Ordering::Acquire);
        head.wrapping_sub(tail)
    }

    #[inline]
    pub fn write_frame(
        &mut self,
        kind: FrameKind,
        timestamp_ms: u64,
        payload: &[u8],
    ) -> Result<(), RingError> {
        let max_len = (self.shared.capacity - 1 - FrameHeader::SIZE).min(u32::MAX as usize);
        if payload.len() > max_len {
            return Err(RingError::PayloadTooLarge {
                payload_len: payload.len(),
                max_len,
            });
        }

        let header = FrameHeader::new(kind, timestamp_ms, payload.len() as u32);
        let total_size = header.total_size();
        let available = self.available();
        if total_size > available {
            return Err(RingError::NotEnoughSpace {
                required: total_size,
                available,
            });
        }

        let head = self.shared.head.load(Ordering::Relaxed);
        unsafe {
            self.shared.copy_in(head, header.as_bytes());
            self.shared
                .copy_in(head.wrapping_add(FrameHeader::SIZE), payload);
        }

        self.shared
            .head
            .store(head.wrapping_add(total_size), Ordering::Release);
        Ok(())
    }
}

impl Consumer {
    #[inline]
    pub fn read_frame(&mut self) -> Option<(FrameHeader, Vec<u8>)> {
        let tail = self.shared.tail.load(Ordering::Relaxed);
        let head = self.shared.head.load(Ordering::Acquire);
        if head == tail {
            return None;
        }

        let mut header_bytes = [0u8; FrameHeader::SIZE];
        let header = unsafe {
            self.shared.copy_out(tail, &mut header_bytes);
            FrameHeader::from_bytes(&header_bytes)
        };

        let mut payload = vec![0u8; header.payload_len as usize];
        unsafe {
            self.shared
                .copy_out(tail.wrapping_add(FrameHeader::SIZE), &mut payload);
        }

        self.shared
            .tail
            .store(tail.wrapping_add(header.total_size()), Ordering::Release);
        Some((header, payload))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.head.load(Ordering::Acquire) == self.shared.tail.load(Ordering::Relaxed)
    }
}
