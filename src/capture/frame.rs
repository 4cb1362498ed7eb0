use std::ptr;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Begin a new recording; payload is the recording name.
    Start = 1,
    /// PCM audio for the current recording.
    Audio = 2,
    /// End of stream.
    Stop = 3,
}

impl TryFrom<u8> for FrameKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Start),
            2 => Ok(Self::Audio),
            3 => Ok(Self::Stop),
            other => Err(other),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FrameHeader {
    pub timestamp_ms: u64,
    pub kind: u8,
    pub flags: u8,
    pub _reserved: u16,
    pub payload_len: u32,
}

impl FrameHeader {
    pub const SIZE: usize = 16;

    pub fn new(kind: FrameKind, timestamp_ms: u64, payload_len: u32) -> Self {
        Self {
            timestamp_ms,
            kind: kind as u8,
            flags: 0,
            _reserved: 0,
            payload_len,
        }
    }

    pub fn kind(&self) -> Option<FrameKind> {
        FrameKind::try_from(self.kind).ok()
    }

    pub fn total_size(&self) -> usize {
        Self::SIZE + self.payload_len as usize
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; Self::SIZE] {
        unsafe { &*(self as *const Self as *const [u8; Self::SIZE]) }
    }

    #[inline]
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        // Every bit pattern is a valid header; `kind` is checked on use.
        unsafe { ptr::read_unaligned(bytes.as_ptr() as *const Self) }
    }
}
