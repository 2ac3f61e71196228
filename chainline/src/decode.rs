//! Chain decoding: host round trips into an ordered reader list.
//!
//! The host's buffer chain is an opaque linked structure. It is never
//! walked as a graph. Each round trip consumes the current chain handle,
//! fills a scratch buffer with a batch of descriptor records, and returns
//! the handle to continue from (or a terminal code). The decoder loops
//! until the chain is consumed, turning every descriptor into a range
//! reader in host order and folding the flag bits into one aggregate.

use protocol_chain::{Batch, ChainFlags, Location};

use crate::error::ChainError;
use crate::metrics;
use crate::pool::ScratchPool;
use crate::reader::{FileRangeReader, MemoryRangeReader, RangeReader};

/// One round trip against the host's chain structure.
///
/// `decode_step` fills `buf` from index 0 with one batch in the
/// `protocol-chain` wire format and returns:
///
/// - `0`: chain fully consumed,
/// - a negative code: protocol error, the chain is unusable,
/// - anything else: the handle to pass to the next round trip.
///
/// # Contract
/// Memory descriptors written into `buf` name ranges inside the host
/// process. The implementation must keep those ranges valid, initialized,
/// and unmodified for the lifetime of the request that owns the chain;
/// readers copy from them lazily, long after the round trip returns.
pub trait ChainHost {
    /// Perform one round trip for `handle`, filling `buf` with the batch.
    fn decode_step(&mut self, handle: u64, buf: &mut [u8]) -> i64;
}

impl<F> ChainHost for F
where
    F: FnMut(u64, &mut [u8]) -> i64,
{
    fn decode_step(&mut self, handle: u64, buf: &mut [u8]) -> i64 {
        self(handle, buf)
    }
}

/// Opaque diagnostic tag for the request a chain belongs to.
///
/// Carried into [`ChainError::InvalidChain`] for observability; it has no
/// behavior of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestTag(pub u64);

impl std::fmt::Display for RequestTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The fully decoded form of one chain: readers in host order plus the
/// aggregate flags.
#[derive(Debug)]
pub struct DecodedChain {
    /// One reader per descriptor, in the exact order the host returned.
    pub readers: Vec<RangeReader>,
    /// Sticky OR of Last/Flush across the entire chain.
    pub flags: ChainFlags,
}

/// Decode the chain starting at `handle` into readers and flags.
///
/// Loops one host round trip at a time, borrowing a scratch buffer from
/// `pool` per trip, until the host reports the chain consumed. File-backed
/// descriptors open their file here, eagerly, so an unreadable file fails
/// the decode before any payload byte is read. A `handle` of 0 is an empty
/// chain and performs no round trip.
///
/// On failure the chain is left partially consumed on the host side and
/// must not be decoded again.
pub fn decode_chain<H: ChainHost>(
    host: &mut H,
    pool: &ScratchPool,
    handle: u64,
    request: RequestTag,
) -> Result<DecodedChain, ChainError> {
    let first = handle;
    let mut readers = Vec::new();
    let mut flags = ChainFlags::default();

    let mut handle = handle;
    while handle != 0 {
        // Guard returns the buffer to the pool on every exit path below.
        let mut scratch = pool.acquire();

        let rc = host.decode_step(handle, &mut scratch);
        if rc < 0 {
            metrics::INVALID_CHAIN.increment();
            return Err(ChainError::InvalidChain {
                handle: first,
                code: rc,
                request,
            });
        }
        metrics::ROUND_TRIPS.increment();

        let batch = Batch::parse(&scratch)?;
        for desc in &batch.descriptors {
            flags.merge(desc.kind_byte);
            let reader = match &desc.location {
                Location::Memory { addr } => {
                    metrics::DESCRIPTORS_MEMORY.increment();
                    // Safety: the ChainHost contract keeps this range valid
                    // and unmodified for the owning request's lifetime.
                    RangeReader::Memory(unsafe { MemoryRangeReader::new(*addr, desc.length) })
                }
                Location::File { name, offset } => {
                    metrics::DESCRIPTORS_FILE.increment();
                    RangeReader::File(FileRangeReader::open(name, *offset, desc.length)?)
                }
            };
            readers.push(reader);
        }

        handle = rc as u64;
    }

    Ok(DecodedChain { readers, flags })
}
