//! Wire format for host buffer-chain descriptor batches.
//!
//! A host process exposes its scatter-gather buffer chains through a narrow
//! round-trip call: one opaque chain handle in, one transfer buffer full of
//! descriptor records out. This crate implements the batch wire format,
//! parsing on the consumer side and encoding for host emulators and tests.
//! It performs no I/O: turning descriptors into readable byte ranges is the
//! job of the `chainline` crate.
//!
//! # Example
//!
//! ```
//! use protocol_chain::{Batch, BatchBuilder, Location};
//!
//! // Encode a batch the way the host would.
//! let mut builder = BatchBuilder::new();
//! builder.memory(0x7f00_dead_b000, 5);
//! builder.file("/tmp/body", 0, 6).last();
//! let bytes = builder.encode();
//!
//! // Parse it back.
//! let batch = Batch::parse(&bytes).unwrap();
//! assert_eq!(batch.descriptors.len(), 2);
//! assert!(batch.descriptors[1].is_last());
//! assert!(matches!(batch.descriptors[0].location, Location::Memory { .. }));
//! ```

mod descriptor;
mod error;

pub use descriptor::{
    Batch, BatchBuilder, BufferDescriptor, ChainFlags, Location, BATCH_HEADER_SIZE,
    CHAIN_BUF_FILE_FLAG, CHAIN_BUF_FLUSH_FLAG, CHAIN_BUF_LAST_FLAG, RECORD_SIZE,
};
pub use error::WireError;
