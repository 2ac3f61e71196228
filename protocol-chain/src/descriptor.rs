//! Buffer-chain descriptor records and batch encoding/decoding.
//!
//! One host round trip fills a transfer buffer with a batch of fixed
//! 16-byte descriptor records, one per chain node:
//!
//! ```text
//! bytes 0..8   : u64 record count
//! repeat record-count times, 16 bytes each:
//!   bytes 0..8 : word1 = (kind byte << 56) | length (56 bits)
//!   bytes 8..16: word2 = address                              (memory)
//!                      = (filename len << 48) | offset (48)   (file)
//! trailing     : filename byte sequences for each file record,
//!                concatenated in record order (UTF-8)
//! ```
//!
//! Words are native-endian: the host writes them in its own byte order and
//! never moves batches across machines.

use crate::error::WireError;

/// Size of the record-count header at the front of every batch.
pub const BATCH_HEADER_SIZE: usize = 8;

/// Size of one descriptor record.
pub const RECORD_SIZE: usize = 16;

// Kind-byte bit assignments. These mirror the host's documented constants
// one-for-one; the remaining five bits are reserved and carried verbatim.

/// Descriptor is file-backed; word2 carries filename length and offset.
pub const CHAIN_BUF_FILE_FLAG: u8 = 1 << 0;
/// Descriptor ends the host-originated logical message.
pub const CHAIN_BUF_LAST_FLAG: u8 = 1 << 1;
/// Consumer should emit buffered output immediately.
pub const CHAIN_BUF_FLUSH_FLAG: u8 = 1 << 2;

const LENGTH_MASK: u64 = 0x00ff_ffff_ffff_ffff;
const OFFSET_MASK: u64 = 0x0000_ffff_ffff_ffff;

/// Aggregate Last/Flush flags folded from every descriptor in a chain.
///
/// Sticky: once a bit is set by any descriptor it stays set, independent of
/// position in the chain. The File bit is per-record addressing information,
/// not message state, so `merge` never folds it in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainFlags(u8);

impl ChainFlags {
    /// OR the Last/Flush bits of one kind byte into the aggregate.
    pub fn merge(&mut self, kind_byte: u8) {
        self.0 |= kind_byte & (CHAIN_BUF_LAST_FLAG | CHAIN_BUF_FLUSH_FLAG);
    }

    /// True if any merged descriptor carried the Last flag.
    pub fn is_last(&self) -> bool {
        self.0 & CHAIN_BUF_LAST_FLAG != 0
    }

    /// True if any merged descriptor carried the Flush flag.
    pub fn is_flush(&self) -> bool {
        self.0 & CHAIN_BUF_FLUSH_FLAG != 0
    }
}

/// Payload location of one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Native address of a memory-backed buffer inside the host process.
    Memory {
        /// Address of the first payload byte.
        addr: u64,
    },
    /// Byte range inside a file.
    File {
        /// Path to the backing file.
        name: String,
        /// Start offset of the payload within the file (48 bits).
        offset: u64,
    },
}

/// One decoded chain node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDescriptor {
    /// Raw kind byte (top byte of word1). Only the three documented flag
    /// bits are interpreted; reserved bits are preserved untouched.
    pub kind_byte: u8,
    /// Payload length in bytes (56-bit field).
    pub length: u64,
    /// Where the payload bytes live.
    pub location: Location,
}

impl BufferDescriptor {
    /// True if this descriptor is file-backed.
    pub fn is_file(&self) -> bool {
        self.kind_byte & CHAIN_BUF_FILE_FLAG != 0
    }

    /// True if this descriptor carries the Last flag.
    pub fn is_last(&self) -> bool {
        self.kind_byte & CHAIN_BUF_LAST_FLAG != 0
    }

    /// True if this descriptor carries the Flush flag.
    pub fn is_flush(&self) -> bool {
        self.kind_byte & CHAIN_BUF_FLUSH_FLAG != 0
    }
}

/// One parsed transfer-buffer batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Descriptors in host order, never reordered or deduplicated. The
    /// relative order defines the byte stream.
    pub descriptors: Vec<BufferDescriptor>,
}

/// Native-endian u64 load at `at`. Caller has already bounds-checked.
fn read_u64(buf: &[u8], at: usize) -> u64 {
    u64::from_ne_bytes([
        buf[at],
        buf[at + 1],
        buf[at + 2],
        buf[at + 3],
        buf[at + 4],
        buf[at + 5],
        buf[at + 6],
        buf[at + 7],
    ])
}

impl Batch {
    /// Parse one batch from the front of a transfer buffer.
    ///
    /// `buf` is the whole transfer buffer; bytes past the batch (pool slack
    /// or stale data from a previous round trip) are ignored.
    pub fn parse(buf: &[u8]) -> Result<Batch, WireError> {
        if buf.len() < BATCH_HEADER_SIZE {
            return Err(WireError::Truncated {
                needed: BATCH_HEADER_SIZE,
                have: buf.len(),
            });
        }
        let count = read_u64(buf, 0);

        let records_len = usize::try_from(count)
            .ok()
            .and_then(|n| n.checked_mul(RECORD_SIZE))
            .and_then(|n| n.checked_add(BATCH_HEADER_SIZE))
            .ok_or(WireError::RecordCount(count))?;
        if buf.len() < records_len {
            return Err(WireError::Truncated {
                needed: records_len,
                have: buf.len(),
            });
        }

        // First pass: fixed records.
        let mut raw = Vec::with_capacity(count as usize);
        let mut at = BATCH_HEADER_SIZE;
        for _ in 0..count {
            raw.push((read_u64(buf, at), read_u64(buf, at + 8)));
            at += RECORD_SIZE;
        }

        // Second pass: filename bytes trail the record array, one run per
        // file record, in record order.
        let mut names = records_len;
        let mut descriptors = Vec::with_capacity(count as usize);
        for (word1, word2) in raw {
            let kind_byte = (word1 >> 56) as u8;
            let length = word1 & LENGTH_MASK;
            let location = if kind_byte & CHAIN_BUF_FILE_FLAG != 0 {
                let name_len = (word2 >> 48) as usize;
                let end = names
                    .checked_add(name_len)
                    .filter(|&end| end <= buf.len())
                    .ok_or(WireError::Truncated {
                        needed: names.saturating_add(name_len),
                        have: buf.len(),
                    })?;
                let name = std::str::from_utf8(&buf[names..end])
                    .map_err(|_| WireError::BadFilename)?
                    .to_owned();
                names = end;
                Location::File {
                    name,
                    offset: word2 & OFFSET_MASK,
                }
            } else {
                Location::Memory { addr: word2 }
            };
            descriptors.push(BufferDescriptor {
                kind_byte,
                length,
                location,
            });
        }

        Ok(Batch { descriptors })
    }
}

/// Builds one batch in wire format, for host emulators and tests.
///
/// Records are emitted in insertion order. `last()` and `flush()` mark the
/// most recently added record.
#[derive(Debug, Default)]
pub struct BatchBuilder {
    records: Vec<(u8, u64, u64)>,
    names: Vec<u8>,
}

impl BatchBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a memory-backed record.
    ///
    /// # Panics
    /// Panics if `length` does not fit in 56 bits.
    pub fn memory(&mut self, addr: u64, length: u64) -> &mut Self {
        assert!(length <= LENGTH_MASK, "length {length} exceeds 56 bits");
        self.records.push((0, length, addr));
        self
    }

    /// Append a file-backed record.
    ///
    /// # Panics
    /// Panics if `length` exceeds 56 bits, `offset` exceeds 48 bits, or the
    /// filename is longer than 16 bits can describe.
    pub fn file(&mut self, name: &str, offset: u64, length: u64) -> &mut Self {
        assert!(length <= LENGTH_MASK, "length {length} exceeds 56 bits");
        assert!(offset <= OFFSET_MASK, "offset {offset} exceeds 48 bits");
        assert!(
            name.len() <= u16::MAX as usize,
            "filename is {} bytes, max {}",
            name.len(),
            u16::MAX
        );
        let word2 = ((name.len() as u64) << 48) | offset;
        self.records.push((CHAIN_BUF_FILE_FLAG, length, word2));
        self.names.extend_from_slice(name.as_bytes());
        self
    }

    /// Set the Last flag on the most recently added record.
    ///
    /// # Panics
    /// Panics if no record has been added.
    pub fn last(&mut self) -> &mut Self {
        self.mark(CHAIN_BUF_LAST_FLAG)
    }

    /// Set the Flush flag on the most recently added record.
    ///
    /// # Panics
    /// Panics if no record has been added.
    pub fn flush(&mut self) -> &mut Self {
        self.mark(CHAIN_BUF_FLUSH_FLAG)
    }

    fn mark(&mut self, flag: u8) -> &mut Self {
        let record = self
            .records
            .last_mut()
            .expect("flag set before any record");
        record.0 |= flag;
        self
    }

    /// Total encoded size of the batch in bytes.
    pub fn encoded_len(&self) -> usize {
        BATCH_HEADER_SIZE + self.records.len() * RECORD_SIZE + self.names.len()
    }

    /// Encode the batch in wire format.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&(self.records.len() as u64).to_ne_bytes());
        for &(kind_byte, length, word2) in &self.records {
            let word1 = ((kind_byte as u64) << 56) | length;
            buf.extend_from_slice(&word1.to_ne_bytes());
            buf.extend_from_slice(&word2.to_ne_bytes());
        }
        buf.extend_from_slice(&self.names);
        buf
    }
}
