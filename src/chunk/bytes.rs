//! Owned byte-array chunks.

use crate::chunk::{ChunkTarget, ChunkType};
use crate::length::{bits, Bits};

/// A chunk holding an owned, ordered sequence of octets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytesChunk {
    bytes: Vec<u8>,
}

impl BytesChunk {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn length(&self) -> Bits {
        bits(self.bytes.len() as u64 * 8)
    }

    pub fn byte_at(&self, index: usize) -> u8 {
        self.bytes[index]
    }

    /// Overwrite one octet. Callers go through the copy-on-write handle
    /// accessor, which enforces mutability.
    pub fn set_byte(&mut self, index: usize, value: u8) {
        self.bytes[index] = value;
    }
}

impl ChunkType for BytesChunk {
    fn target() -> ChunkTarget {
        ChunkTarget::Bytes
    }
}
