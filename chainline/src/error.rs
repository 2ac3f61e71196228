use std::io;

use protocol_chain::WireError;

use crate::decode::RequestTag;

/// Errors produced while decoding a buffer chain.
///
/// Both kinds are fatal to the chain being decoded. The host is the single
/// source of truth, so nothing here is retryable: an inconsistency is a
/// protocol violation, not a transient fault.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Host round trip returned an unexpected code. The chain is left
    /// partially decoded and must not be reused.
    #[error("invalid chain {handle:#x}: host returned {code} (request {request})")]
    InvalidChain {
        /// The chain handle the decode started from.
        handle: u64,
        /// The code the host returned.
        code: i64,
        /// Diagnostic tag of the owning request.
        request: RequestTag,
    },

    /// Malformed descriptor batch.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// File open or read failure for a file-backed descriptor.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
