//! The composite pull stream over a decoded chain.

use std::io::{self, Read};

use protocol_chain::ChainFlags;

use crate::decode::{decode_chain, ChainHost, RequestTag};
use crate::error::ChainError;
use crate::pool::ScratchPool;
use crate::reader::RangeReader;

/// A single linear byte stream over one host buffer chain.
///
/// Concatenates the chain's range readers in host order. The stream owns
/// its readers exclusively and is consumed by exactly one caller; reads
/// take `&mut self` and there is no internal synchronization.
///
/// # Example
///
/// ```
/// use std::io::Read;
/// use chainline::{ChainStream, RequestTag, ScratchPool};
/// use protocol_chain::BatchBuilder;
///
/// let payload = b"HELLO".to_vec();
/// let batch = {
///     let mut builder = BatchBuilder::new();
///     builder.memory(payload.as_ptr() as u64, 5).last();
///     builder.encode()
/// };
/// let mut host = move |_handle: u64, buf: &mut [u8]| -> i64 {
///     buf[..batch.len()].copy_from_slice(&batch);
///     0 // chain consumed in one trip
/// };
///
/// let pool = ScratchPool::default();
/// let mut stream = ChainStream::decode(&mut host, &pool, 1, RequestTag(7)).unwrap();
///
/// let mut body = String::new();
/// stream.read_to_string(&mut body).unwrap();
/// assert_eq!(body, "HELLO");
/// assert!(stream.is_last());
/// ```
#[derive(Debug)]
pub struct ChainStream {
    handle: u64,
    request: RequestTag,
    readers: Vec<RangeReader>,
    cursor: usize,
    flags: ChainFlags,
}

impl ChainStream {
    /// Decode the chain at `handle` and wrap it as a stream.
    ///
    /// All host round trips happen here; reading afterwards never calls
    /// the host again. See [`decode_chain`] for failure behavior.
    pub fn decode<H: ChainHost>(
        host: &mut H,
        pool: &ScratchPool,
        handle: u64,
        request: RequestTag,
    ) -> Result<Self, ChainError> {
        let decoded = decode_chain(host, pool, handle, request)?;
        Ok(ChainStream {
            handle,
            request,
            readers: decoded.readers,
            cursor: 0,
            flags: decoded.flags,
        })
    }

    /// A stream over no chain at all: immediately at end of stream, both
    /// flags clear.
    pub fn empty() -> Self {
        ChainStream {
            handle: 0,
            request: RequestTag::default(),
            readers: Vec::new(),
            cursor: 0,
            flags: ChainFlags::default(),
        }
    }

    /// True if any descriptor in the chain carried the Last flag: the
    /// host-originated logical message ends with this chain.
    ///
    /// Computed once during decode; valid at any time.
    pub fn is_last(&self) -> bool {
        self.flags.is_last()
    }

    /// True if any descriptor in the chain carried the Flush flag: the
    /// consumer should emit buffered output immediately.
    pub fn is_flush(&self) -> bool {
        self.flags.is_flush()
    }

    /// The chain handle this stream was decoded from.
    pub fn handle(&self) -> u64 {
        self.handle
    }

    /// Diagnostic tag of the owning request.
    pub fn request(&self) -> RequestTag {
        self.request
    }
}

impl Read for ChainStream {
    /// Pull from the reader at the cursor, skipping exhausted readers.
    ///
    /// A reader that yields 0 bytes advances the cursor and the pull
    /// retries the next one, until some reader yields bytes or the list
    /// runs out. `Ok(0)` is terminal: once the last reader is exhausted
    /// every later read returns `Ok(0)` again.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.cursor < self.readers.len() {
            let n = self.readers[self.cursor].read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            self.cursor += 1;
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol_chain::BatchBuilder;

    fn single_batch_host(batch: Vec<u8>) -> impl FnMut(u64, &mut [u8]) -> i64 {
        move |_, buf: &mut [u8]| {
            buf[..batch.len()].copy_from_slice(&batch);
            0
        }
    }

    #[test]
    fn empty_stream_is_eof() {
        let mut stream = ChainStream::empty();
        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
        assert!(!stream.is_last());
        assert!(!stream.is_flush());
        assert_eq!(stream.handle(), 0);
    }

    #[test]
    fn zero_descriptor_chain_is_eof() {
        let pool = ScratchPool::new(256);
        let mut host = single_batch_host(BatchBuilder::new().encode());
        let mut stream = ChainStream::decode(&mut host, &pool, 5, RequestTag::default()).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
        assert_eq!(stream.handle(), 5);
    }

    #[test]
    fn skips_zero_length_readers() {
        let data = b"xy".to_vec();
        let empty = b"".to_vec();
        let batch = {
            let mut builder = BatchBuilder::new();
            builder.memory(empty.as_ptr() as u64, 0);
            builder.memory(data.as_ptr() as u64, 2);
            builder.memory(empty.as_ptr() as u64, 0);
            builder.encode()
        };
        let pool = ScratchPool::new(256);
        let mut host = single_batch_host(batch);
        let mut stream = ChainStream::decode(&mut host, &pool, 1, RequestTag::default()).unwrap();

        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"xy");
        drop(data);
    }

    #[test]
    fn eof_is_terminal() {
        let data = b"z".to_vec();
        let batch = {
            let mut builder = BatchBuilder::new();
            builder.memory(data.as_ptr() as u64, 1);
            builder.encode()
        };
        let pool = ScratchPool::new(256);
        let mut host = single_batch_host(batch);
        let mut stream = ChainStream::decode(&mut host, &pool, 1, RequestTag::default()).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap(), 1);
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
        drop(data);
    }

    #[test]
    fn zero_length_destination_reads_nothing() {
        let data = b"z".to_vec();
        let batch = {
            let mut builder = BatchBuilder::new();
            builder.memory(data.as_ptr() as u64, 1);
            builder.encode()
        };
        let pool = ScratchPool::new(256);
        let mut host = single_batch_host(batch);
        let mut stream = ChainStream::decode(&mut host, &pool, 1, RequestTag::default()).unwrap();

        assert_eq!(stream.read(&mut []).unwrap(), 0);
        // The single byte is still there.
        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap(), 1);
        drop(data);
    }
}
