//! Bounded byte sources over one descriptor's payload.
//!
//! Each chain node becomes one range reader: memory-backed nodes read
//! straight out of host memory, file-backed nodes read a window of a file.
//! The composite stream concatenates them; nothing here is seekable or
//! rewindable.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

/// Bounded reader over a borrowed range of host memory.
///
/// This is a borrow, not an owned buffer. The range belongs to the host
/// and stays valid only for the lifetime of the request that produced the
/// chain. The reader must not be read after that request completes, and
/// never frees or mutates the underlying memory.
#[derive(Debug)]
pub struct MemoryRangeReader {
    base: *const u8,
    len: usize,
    pos: usize,
}

// Safety: the reader only ever copies out of the range. The host keeps the
// range valid and unaliased-for-writes for the owning request's lifetime
// (see [`ChainHost`](crate::decode::ChainHost)), and a chain has exactly
// one consumer, so moving the reader to another worker thread is sound.
unsafe impl Send for MemoryRangeReader {}

impl MemoryRangeReader {
    /// Create a reader over `len` bytes starting at host address `addr`.
    ///
    /// # Safety
    /// `addr..addr + len` must be readable, initialized memory that stays
    /// valid and unmodified until the reader is dropped or the owning
    /// request completes, whichever comes first.
    pub unsafe fn new(addr: u64, len: u64) -> Self {
        MemoryRangeReader {
            base: addr as usize as *const u8,
            len: len as usize,
            pos: 0,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.len - self.pos
    }

    /// Copy up to `dst.len()` bytes out of the range, advancing the cursor.
    /// Returns 0 once the range is exhausted.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        let n = dst.len().min(self.remaining());
        if n > 0 {
            // Safety: `pos + n <= len`, so the source stays inside the
            // range the constructor was promised.
            unsafe {
                std::ptr::copy_nonoverlapping(self.base.add(self.pos), dst.as_mut_ptr(), n);
            }
            self.pos += n;
        }
        n
    }
}

/// Bounded reader over `[start, start + length)` of a file.
///
/// Opens the file read-only and seeks to `start` at construction, so open
/// failures surface at decode time, before any byte is read. Never yields
/// bytes past the window even if the file is longer; a file shorter than
/// the window simply ends early.
#[derive(Debug)]
pub struct FileRangeReader {
    file: File,
    remaining: u64,
}

impl FileRangeReader {
    /// Open `path` and position the window at `[start, start + length)`.
    pub fn open(path: &str, start: u64, length: u64) -> io::Result<Self> {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(start))?;
        Ok(FileRangeReader {
            file,
            remaining: length,
        })
    }

    /// Read up to `dst.len()` bytes from the window. Returns `Ok(0)` once
    /// the window (or the file) is exhausted.
    pub fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let cap = dst.len().min(self.remaining as usize);
        let n = self.file.read(&mut dst[..cap])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// One chain node's payload as a readable byte range.
#[derive(Debug)]
pub enum RangeReader {
    /// Memory-backed node.
    Memory(MemoryRangeReader),
    /// File-backed node.
    File(FileRangeReader),
}

impl RangeReader {
    /// Read up to `dst.len()` bytes. `Ok(0)` means this range is exhausted.
    pub fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        match self {
            RangeReader::Memory(r) => Ok(r.read(dst)),
            RangeReader::File(r) => r.read(dst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn memory_reader_partial_reads() {
        let data = b"abcdef".to_vec();
        let mut reader = unsafe { MemoryRangeReader::new(data.as_ptr() as u64, 6) };

        let mut dst = [0u8; 4];
        assert_eq!(reader.read(&mut dst), 4);
        assert_eq!(&dst, b"abcd");
        assert_eq!(reader.remaining(), 2);

        assert_eq!(reader.read(&mut dst), 2);
        assert_eq!(&dst[..2], b"ef");
        assert_eq!(reader.read(&mut dst), 0);
        drop(data);
    }

    #[test]
    fn memory_reader_shorter_than_backing() {
        let data = b"abcdef".to_vec();
        // Window covers only the first three bytes.
        let mut reader = unsafe { MemoryRangeReader::new(data.as_ptr() as u64, 3) };
        let mut dst = [0u8; 16];
        assert_eq!(reader.read(&mut dst), 3);
        assert_eq!(&dst[..3], b"abc");
        assert_eq!(reader.read(&mut dst), 0);
        drop(data);
    }

    #[test]
    fn file_reader_window() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"0123456789").unwrap();

        let mut reader = FileRangeReader::open(tmp.path().to_str().unwrap(), 2, 4).unwrap();
        let mut dst = [0u8; 16];
        let n = reader.read(&mut dst).unwrap();
        assert_eq!(&dst[..n], b"2345");
        assert_eq!(reader.read(&mut dst).unwrap(), 0);
    }

    #[test]
    fn file_reader_stops_at_window_end_not_file_end() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"WORLD!trailing-garbage").unwrap();

        let mut reader = FileRangeReader::open(tmp.path().to_str().unwrap(), 0, 6).unwrap();
        let mut out = Vec::new();
        let mut dst = [0u8; 3];
        loop {
            let n = reader.read(&mut dst).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&dst[..n]);
        }
        assert_eq!(out, b"WORLD!");
    }

    #[test]
    fn file_reader_window_past_eof_ends_early() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"short").unwrap();

        let mut reader = FileRangeReader::open(tmp.path().to_str().unwrap(), 0, 100).unwrap();
        let mut dst = [0u8; 64];
        assert_eq!(reader.read(&mut dst).unwrap(), 5);
        assert_eq!(reader.read(&mut dst).unwrap(), 0);
    }

    #[test]
    fn file_reader_open_failure() {
        assert!(FileRangeReader::open("/nonexistent/chainline-test", 0, 1).is_err());
    }
}
