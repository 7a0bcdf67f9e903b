//! Sparse offset-addressed chunk storage.
//!
//! A [`ChunkBuffer`] holds disjoint `(offset, chunk)` regions sorted by
//! offset. Writing clips or splits whatever it overlaps, and data that
//! becomes adjacent merges into one region under the chunk merge rules —
//! so slices of the same header written out of order coalesce back into
//! the original record. [`ReassemblyBuffer`] and [`ReorderBuffer`] build
//! datagram reassembly and stream reordering on top.

mod reassembly;
mod reorder;

pub use reassembly::ReassemblyBuffer;
pub use reorder::ReorderBuffer;

use smallvec::SmallVec;
use tracing::trace;

use crate::chunk::{build_sequence, ChunkHandle};
use crate::error::Result;
use crate::length::Bits;

#[derive(Debug, Clone)]
struct Region {
    offset: Bits,
    data: ChunkHandle,
}

impl Region {
    fn end(&self) -> Bits {
        self.offset + self.data.length()
    }
}

/// A set of non-overlapping, non-adjacent data regions.
#[derive(Debug, Clone, Default)]
pub struct ChunkBuffer {
    regions: SmallVec<[Region; 4]>,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of disjoint regions.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Start offset of the `index`-th region (sorted by offset).
    pub fn region_offset(&self, index: usize) -> Bits {
        self.regions[index].offset
    }

    /// Data of the `index`-th region.
    pub fn region_data(&self, index: usize) -> &ChunkHandle {
        &self.regions[index].data
    }

    /// Write `chunk` at `offset`, overwriting overlapped bytes.
    ///
    /// Overlapping regions are clipped or split; regions touching the new
    /// data merge with it, applying the chunk merge rules.
    pub fn replace(&mut self, offset: Bits, chunk: &ChunkHandle) -> Result<()> {
        let length = chunk.length();
        if length == Bits::ZERO {
            return Ok(());
        }
        let end = offset + length;
        trace!(offset = %offset, length = %length, "buffer replace");

        let mut before: SmallVec<[Region; 4]> = SmallVec::new();
        let mut after: SmallVec<[Region; 4]> = SmallVec::new();
        let mut head: Option<(Bits, ChunkHandle)> = None;
        let mut tail: Option<ChunkHandle> = None;

        for region in self.regions.drain(..) {
            if region.end() < offset {
                before.push(region);
            } else if region.offset > end {
                after.push(region);
            } else if region.end() == offset {
                // Touching on the left: absorb whole.
                head = Some((region.offset, region.data));
            } else if region.offset == end {
                // Touching on the right: absorb whole.
                tail = Some(region.data);
            } else {
                // Overlap: keep the parts outside the window.
                if region.offset < offset {
                    let keep = offset - region.offset;
                    head = Some((region.offset, region.data.peek_at(Bits::ZERO, Some(keep))?));
                }
                if region.end() > end {
                    let from = end - region.offset;
                    tail = Some(region.data.peek_at(from, Some(region.end() - end))?);
                }
            }
        }

        let new_offset = head.as_ref().map_or(offset, |(o, _)| *o);
        let mut parts: SmallVec<[ChunkHandle; 4]> = SmallVec::new();
        if let Some((_, data)) = head {
            parts.push(data);
        }
        parts.push(chunk.clone());
        if let Some(data) = tail {
            parts.push(data);
        }
        let data = build_sequence(parts);

        self.regions = before;
        self.regions.push(Region {
            offset: new_offset,
            data,
        });
        self.regions.extend(after);
        Ok(())
    }

    /// Erase the window `[offset, offset + length)`, splitting regions
    /// that straddle its boundaries.
    pub fn clear(&mut self, offset: Bits, length: Bits) -> Result<()> {
        if length == Bits::ZERO {
            return Ok(());
        }
        let end = offset + length;
        trace!(offset = %offset, length = %length, "buffer clear");

        let mut kept: SmallVec<[Region; 4]> = SmallVec::new();
        for region in self.regions.drain(..) {
            if region.end() <= offset || region.offset >= end {
                kept.push(region);
                continue;
            }
            if region.offset < offset {
                let keep = offset - region.offset;
                kept.push(Region {
                    offset: region.offset,
                    data: region.data.peek_at(Bits::ZERO, Some(keep))?,
                });
            }
            if region.end() > end {
                let from = end - region.offset;
                kept.push(Region {
                    offset: end,
                    data: region.data.peek_at(from, Some(region.end() - end))?,
                });
            }
        }
        self.regions = kept;
        Ok(())
    }
}
