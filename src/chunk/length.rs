//! Length-only placeholder chunks.

use crate::chunk::{ChunkTarget, ChunkType};
use crate::length::Bits;

/// A chunk of known length whose contents are unspecified.
///
/// Useful when only the amount of data matters (modelled payloads,
/// padding). Serializes as [`LengthChunk::FILL_BYTE`] repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthChunk {
    length: Bits,
}

impl LengthChunk {
    /// Fill byte emitted when a length-only chunk is serialized.
    pub const FILL_BYTE: u8 = b'?';

    pub fn new(length: Bits) -> Self {
        Self { length }
    }

    pub fn length(&self) -> Bits {
        self.length
    }
}

impl ChunkType for LengthChunk {
    fn target() -> ChunkTarget {
        ChunkTarget::Length
    }
}
