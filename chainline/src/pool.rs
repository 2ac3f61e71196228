//! Scratch buffer pool for host round trips.
//!
//! Each decode round trip borrows one fixed-capacity transfer buffer,
//! hands it to the host to fill, parses the batch out of it, and returns
//! it. Buffers are recycled through a free list shared by every clone of
//! the pool, so many chains can decode concurrently (one buffer checked
//! out per in-flight round trip) without reallocating.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};

use bytes::BytesMut;

use crate::metrics;

/// Default capacity of one scratch buffer in bytes.
///
/// One batch must fit in one buffer: 8 bytes of header plus 16 per record
/// plus filename bytes. The host splits chains that need more into
/// multiple round trips, so this bounds per-trip transfer size, not chain
/// length.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 16 * 1024;

/// A shared pool of fixed-capacity scratch buffers.
///
/// Cloning is cheap and clones share the same free list.
#[derive(Clone)]
pub struct ScratchPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    buffer_capacity: usize,
    free: Mutex<Vec<BytesMut>>,
}

impl ScratchPool {
    /// Create a pool whose buffers hold `buffer_capacity` bytes each.
    pub fn new(buffer_capacity: usize) -> Self {
        ScratchPool {
            inner: Arc::new(PoolInner {
                buffer_capacity,
                free: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Capacity of each buffer in this pool.
    pub fn buffer_capacity(&self) -> usize {
        self.inner.buffer_capacity
    }

    /// Number of buffers currently sitting in the free list.
    pub fn idle(&self) -> usize {
        self.inner.free.lock().unwrap().len()
    }

    /// Check out one scratch buffer, reusing a free one when available.
    ///
    /// The buffer is zero-filled to capacity so stale bytes from a previous
    /// chain never reach a later parse. It returns to the free list when the
    /// guard drops, on every exit path, including decode failure.
    pub fn acquire(&self) -> ScratchGuard {
        let reused = self.inner.free.lock().unwrap().pop();
        let mut buf = match reused {
            Some(buf) => {
                metrics::SCRATCH_REUSED.increment();
                buf
            }
            None => {
                metrics::SCRATCH_ALLOCATED.increment();
                BytesMut::with_capacity(self.inner.buffer_capacity)
            }
        };
        buf.clear();
        buf.resize(self.inner.buffer_capacity, 0);
        ScratchGuard {
            buf,
            pool: Arc::clone(&self.inner),
        }
    }
}

impl Default for ScratchPool {
    fn default() -> Self {
        Self::new(DEFAULT_SCRATCH_CAPACITY)
    }
}

/// Exclusive checkout of one scratch buffer.
///
/// Derefs to `[u8]` spanning the full buffer capacity. Dropping the guard
/// returns the buffer to the pool.
pub struct ScratchGuard {
    buf: BytesMut,
    pool: Arc<PoolInner>,
}

impl Deref for ScratchGuard {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for ScratchGuard {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.pool.free.lock().unwrap().push(buf);
    }
}
