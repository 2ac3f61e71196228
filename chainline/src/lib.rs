//! chainline — streams host scatter-gather buffer chains as one linear
//! byte stream.
//!
//! A host process keeps request bodies in linked chains of buffer nodes,
//! each node either a range of host memory or a range inside a file. The
//! host exposes a chain through a narrow round-trip call (one opaque
//! handle in, one descriptor batch out; see `protocol-chain`). This crate
//! drives those round trips, turns every descriptor into a bounded range
//! reader, and concatenates the readers into a [`ChainStream`] that
//! request-processing code consumes through [`std::io::Read`], along with
//! two pieces of out-of-band metadata derived from the descriptor flags:
//! [`ChainStream::is_last`] and [`ChainStream::is_flush`].
//!
//! Decoding is eager (all round trips and file opens happen up front);
//! reading is lazy and never calls the host. A stream is owned and driven
//! by exactly one task. The only shared resource is the [`ScratchPool`]
//! of transfer buffers, which many concurrent decodes may draw from.

pub mod decode;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod reader;
pub mod stream;

/// One round trip against the host's chain structure.
pub use decode::ChainHost;
/// Decode a chain into readers and aggregate flags without wrapping it.
pub use decode::{decode_chain, DecodedChain};
/// Opaque diagnostic tag for the request a chain belongs to.
pub use decode::RequestTag;
/// Errors produced while decoding a buffer chain.
pub use error::ChainError;
/// Shared pool of fixed-capacity transfer buffers.
pub use pool::{ScratchGuard, ScratchPool, DEFAULT_SCRATCH_CAPACITY};
/// Bounded byte sources over one descriptor's payload.
pub use reader::{FileRangeReader, MemoryRangeReader, RangeReader};
/// The composite pull stream over a decoded chain.
pub use stream::ChainStream;
