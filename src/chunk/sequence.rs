//! Flat ordered sequences of chunks, with the adjacent-merge pass.
//!
//! A sequence is never nested: inserting a sequence inlines its elements.
//! After any construction the merge pass coalesces adjacent compatible
//! neighbours — contiguous slices of the same inner chunk, byte chunks,
//! length chunks — and a sequence left with a single element collapses to
//! that element. Field records never auto-merge.

use smallvec::SmallVec;

use crate::chunk::{ChunkBody, ChunkHandle};
use crate::length::Bits;

/// An ordered sequence of inner chunks whose logical content is their
/// concatenation. Inline capacity covers the common few-header case.
#[derive(Debug, Clone, Default)]
pub struct SequenceChunk {
    chunks: SmallVec<[ChunkHandle; 4]>,
}

impl SequenceChunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// The inner chunks, in order.
    pub fn chunks(&self) -> &[ChunkHandle] {
        &self.chunks
    }

    pub fn length(&self) -> Bits {
        self.chunks.iter().map(|c| c.length()).sum()
    }

    /// Append a chunk, inlining sequences and merging at the seam.
    pub fn insert_at_end(&mut self, chunk: &ChunkHandle) {
        for element in flattened(chunk) {
            match self.chunks.last().and_then(|last| merge_adjacent(last, &element)) {
                Some(merged) => *self.chunks.last_mut().unwrap() = merged,
                None => self.chunks.push(element),
            }
        }
    }

    /// Prepend a chunk, inlining sequences and merging at the seam.
    pub fn insert_at_beginning(&mut self, chunk: &ChunkHandle) {
        for element in flattened(chunk).rev() {
            match self.chunks.first().and_then(|first| merge_adjacent(&element, first)) {
                Some(merged) => self.chunks[0] = merged,
                None => self.chunks.insert(0, element),
            }
        }
    }

    /// Element in iteration order: forward indexes from the front,
    /// backward from the back.
    pub(crate) fn element(&self, index: usize, forward: bool) -> Option<&ChunkHandle> {
        if forward {
            self.chunks.get(index)
        } else {
            self.chunks
                .len()
                .checked_sub(index + 1)
                .and_then(|i| self.chunks.get(i))
        }
    }

    /// Find the element containing `position` (from the front). Returns the
    /// element index and its start offset; `None` when `position` is at or
    /// past the end.
    pub(crate) fn locate_forward(&self, position: Bits) -> Option<(usize, Bits)> {
        let mut start = Bits::ZERO;
        for (i, chunk) in self.chunks.iter().enumerate() {
            let end = start + chunk.length();
            if position < end {
                return Some((i, start));
            }
            start = end;
        }
        None
    }

    /// Find the element containing the bit just before `end` (from the
    /// front). Returns the element index and its start offset.
    pub(crate) fn locate_backward(&self, end: Bits) -> Option<(usize, Bits)> {
        if end == Bits::ZERO {
            return None;
        }
        self.locate_forward(end.saturating_sub(crate::length::bits(1)))
    }
}

/// Iterate the element handles of `chunk`, inlining one level of sequence
/// (sequences are flat, so one level is all there is).
fn flattened(chunk: &ChunkHandle) -> impl DoubleEndedIterator<Item = ChunkHandle> + '_ {
    let elements: SmallVec<[ChunkHandle; 4]> = match chunk.body() {
        ChunkBody::Sequence(seq) => seq.chunks.iter().cloned().collect(),
        ChunkBody::Empty => SmallVec::new(),
        _ => std::iter::once(chunk.clone()).collect(),
    };
    elements.into_iter()
}

/// Merge two adjacent chunks when merging preserves semantics.
///
/// Returns the combined chunk, or `None` when the pair must stay separate.
/// A combined slice that covers its whole inner chunk collapses to the
/// inner chunk itself.
pub(crate) fn merge_adjacent(a: &ChunkHandle, b: &ChunkHandle) -> Option<ChunkHandle> {
    let merged = match (a.body(), b.body()) {
        (ChunkBody::Slice(left), ChunkBody::Slice(right)) => {
            if !left.inner().ptr_eq(right.inner())
                || left.offset() + left.length() != right.offset()
            {
                return None;
            }
            let inner = left.inner();
            let length = left.length() + right.length();
            if left.offset() == Bits::ZERO && length == inner.length() {
                return Some(inner.clone());
            }
            ChunkHandle::slice_unchecked(inner.clone(), left.offset(), length)
        }
        (ChunkBody::Bytes(left), ChunkBody::Bytes(right)) => {
            let mut bytes = left.bytes().to_vec();
            bytes.extend_from_slice(right.bytes());
            ChunkHandle::from_bytes(bytes)
        }
        (ChunkBody::Length(left), ChunkBody::Length(right)) => {
            ChunkHandle::from_length(left.length() + right.length())
        }
        _ => return None,
    };
    merged.inherit_soft_flags(a);
    merged.inherit_soft_flags(b);
    if a.is_immutable() && b.is_immutable() {
        merged.make_immutable();
    }
    Some(merged)
}

/// Build a chunk from parts: flatten, merge adjacent pairs, and collapse a
/// zero- or one-element result. This is the constructor behind every peek
/// or insertion that yields a sequence.
pub(crate) fn build(parts: impl IntoIterator<Item = ChunkHandle>) -> ChunkHandle {
    let mut sequence = SequenceChunk::new();
    for part in parts {
        sequence.insert_at_end(&part);
    }
    match sequence.chunks.len() {
        0 => ChunkHandle::empty(),
        1 => sequence.chunks.pop().unwrap(),
        _ => ChunkHandle::from(sequence),
    }
}
