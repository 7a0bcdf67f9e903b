//! Stream reordering over a chunk buffer.

use tracing::trace;

use crate::buffer::ChunkBuffer;
use crate::chunk::ChunkHandle;
use crate::error::Result;
use crate::length::Bits;

/// Reorders out-of-order segments of a byte stream.
///
/// Segments are written at absolute stream offsets. [`ReorderBuffer::pop_data`]
/// hands out the contiguous run starting at the expected offset and moves
/// the cursor past it; the cursor never goes backwards.
#[derive(Debug, Clone)]
pub struct ReorderBuffer {
    buffer: ChunkBuffer,
    expected_offset: Bits,
}

impl ReorderBuffer {
    pub fn new(expected_offset: Bits) -> Self {
        Self {
            buffer: ChunkBuffer::new(),
            expected_offset,
        }
    }

    /// The next stream offset waiting to be handed out.
    pub fn expected_offset(&self) -> Bits {
        self.expected_offset
    }

    /// Write a segment at its absolute stream offset.
    pub fn replace(&mut self, offset: Bits, chunk: &ChunkHandle) -> Result<()> {
        self.buffer.replace(offset, chunk)
    }

    /// The contiguous run starting at the expected offset, if present.
    /// Advances the cursor by the returned length.
    pub fn pop_data(&mut self) -> Result<Option<ChunkHandle>> {
        if self.buffer.is_empty() || self.buffer.region_offset(0) != self.expected_offset {
            return Ok(None);
        }
        let data = self.buffer.region_data(0).clone();
        let length = data.length();
        self.buffer.clear(self.expected_offset, length)?;
        self.expected_offset += length;
        trace!(length = %length, expected = %self.expected_offset, "reorder pop");
        Ok(Some(data))
    }
}
