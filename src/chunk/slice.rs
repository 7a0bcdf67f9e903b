//! Window chunks referencing another chunk.

use crate::chunk::ChunkHandle;
use crate::length::Bits;

/// A logical window over another chunk, referenced rather than copied.
///
/// The inner chunk must be immutable; that is what makes sharing the
/// window safe. Peeking a slice composes offsets into the inner chunk, so
/// nested slices never survive a peek.
#[derive(Debug, Clone)]
pub struct SliceChunk {
    inner: ChunkHandle,
    offset: Bits,
    length: Bits,
}

impl SliceChunk {
    pub(crate) fn new(inner: ChunkHandle, offset: Bits, length: Bits) -> Self {
        Self {
            inner,
            offset,
            length,
        }
    }

    /// The chunk this slice windows into.
    pub fn inner(&self) -> &ChunkHandle {
        &self.inner
    }

    /// Window start within the inner chunk.
    pub fn offset(&self) -> Bits {
        self.offset
    }

    pub fn length(&self) -> Bits {
        self.length
    }
}
