use super::{StorageError, WavHeader};
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::ptr;

/// Appends PCM frames to a preallocated, memory-mapped WAV file.
///
/// The header's sizes are kept current after every write, so a reader sees a
/// valid file at any point. On drop the file is truncated to the audio
/// actually written.
pub struct MmapWavWriter {
    file: File,
    mmap_ptr: *mut u8,
    mmap_len: usize,
    write_offset: usize,
}

impl MmapWavWriter {
    pub fn create<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self, StorageError> {
        let capacity = Self::clamp_capacity(capacity);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(capacity as u64)?;

        let mut writer = Self::map(file, capacity, WavHeader::SIZE)?;
        writer.write_header(&WavHeader::new());
        Ok(writer)
    }

    /// Reopens an existing recording to append to it, growing the file to
    /// at least `capacity` bytes.
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self, StorageError> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        let len = file.metadata()?.len() as usize;
        let mut bytes = [0u8; WavHeader::SIZE];
        if len >= WavHeader::SIZE {
            (&file).read_exact(&mut bytes)?;
        }
        let header = WavHeader::parse(&bytes[..len.min(WavHeader::SIZE)])?;

        let write_offset = WavHeader::SIZE + header.data_len();
        let capacity = Self::clamp_capacity(capacity.max(len).max(write_offset));
        file.set_len(capacity as u64)?;

        Self::map(file, capacity, write_offset)
    }

    fn clamp_capacity(capacity: usize) -> usize {
        capacity
            .max(4096)
            .min(WavHeader::SIZE + u32::MAX as usize)
    }

    fn map(file: File, capacity: usize, write_offset: usize) -> Result<Self, StorageError> {
        let mmap_ptr = Self::map_file(&file, capacity)?;

        Ok(Self {
            file,
            mmap_ptr,
            mmap_len: capacity,
            write_offset,
        })
    }

    fn map_file(file: &File, capacity: usize) -> io::Result<*mut u8> {
        let mmap_ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                capacity,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };

        if mmap_ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        Ok(mmap_ptr as *mut u8)
    }

    /// Extends the file and its mapping to `capacity` bytes. Returns false
    /// when the file already reached that size or the WAV size limit.
    pub fn grow(&mut self, capacity: usize) -> Result<bool, StorageError> {
        let capacity = Self::clamp_capacity(capacity);
        if capacity <= self.mmap_len {
            return Ok(false);
        }

        self.sync()?;
        self.file.set_len(capacity as u64)?;
        let mmap_ptr = Self::map_file(&self.file, capacity)?;

        unsafe {
            libc::munmap(self.mmap_ptr as *mut libc::c_void, self.mmap_len);
        }
        self.mmap_ptr = mmap_ptr;
        self.mmap_len = capacity;
        Ok(true)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.mmap_len
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.mmap_len - self.write_offset
    }

    #[inline]
    pub fn data_len(&self) -> usize {
        self.write_offset - WavHeader::SIZE
    }

    #[inline]
    pub fn write_frames(&mut self, frames: &[u8]) -> bool {
        if frames.len() > self.available() {
            return false;
        }

        unsafe {
            ptr::copy_nonoverlapping(
                frames.as_ptr(),
                self.mmap_ptr.add(self.write_offset),
                frames.len(),
            );
        }

        self.write_offset += frames.len();
        self.update_header();

        true
    }

    pub fn sync(&self) -> io::Result<()> {
        self.msync(libc::MS_SYNC)
    }

    pub fn sync_async(&self) -> io::Result<()> {
        self.msync(libc::MS_ASYNC)
    }

    fn msync(&self, flags: libc::c_int) -> io::Result<()> {
        let result =
            unsafe { libc::msync(self.mmap_ptr as *mut libc::c_void, self.mmap_len, flags) };

        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    pub fn header(&self) -> WavHeader {
        WavHeader::with_data_len(self.data_len() as u32)
    }

    #[inline]
    fn write_header(&mut self, header: &WavHeader) {
        unsafe {
            ptr::copy_nonoverlapping(header.to_bytes().as_ptr(), self.mmap_ptr, WavHeader::SIZE);
        }
    }

    #[inline]
    fn update_header(&mut self) {
        let header = self.header();
        self.write_header(&header);
    }
}

impl Drop for MmapWavWriter {
    fn drop(&mut self) {
        let _ = self.sync();

        unsafe {
            libc::munmap(self.mmap_ptr as *mut libc::c_void, self.mmap_len);
        }

        let _ = self.file.set_len(self.write_offset as u64);
    }
}

unsafe impl Send for MmapWavWriter {}
