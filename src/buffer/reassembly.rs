//! Datagram reassembly over a chunk buffer.

use crate::buffer::ChunkBuffer;
use crate::chunk::ChunkHandle;
use crate::error::Result;
use crate::length::Bits;

/// Collects fragments of a datagram of known total length.
///
/// Fragments are written at their offsets; the datagram is complete when
/// a single region covers `[0, expected_length)`.
#[derive(Debug, Clone)]
pub struct ReassemblyBuffer {
    buffer: ChunkBuffer,
    expected_length: Bits,
}

impl ReassemblyBuffer {
    pub fn new(expected_length: Bits) -> Self {
        Self {
            buffer: ChunkBuffer::new(),
            expected_length,
        }
    }

    pub fn expected_length(&self) -> Bits {
        self.expected_length
    }

    /// Write a fragment at its offset within the datagram.
    pub fn replace(&mut self, offset: Bits, chunk: &ChunkHandle) -> Result<()> {
        self.buffer.replace(offset, chunk)
    }

    /// Whether one region covers the whole datagram.
    pub fn is_complete(&self) -> bool {
        self.buffer.region_count() == 1
            && self.buffer.region_offset(0) == Bits::ZERO
            && self.buffer.region_data(0).length() == self.expected_length
    }

    /// The reassembled datagram, once complete.
    pub fn data(&self) -> Option<ChunkHandle> {
        self.is_complete().then(|| self.buffer.region_data(0).clone())
    }
}
