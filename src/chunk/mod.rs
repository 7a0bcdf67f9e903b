//! Chunk algebra: variants, status flags, sharing, and the peek engine.
//!
//! A [`Chunk`] is a contiguous region of protocol data — one of a closed
//! set of representations ([`ChunkBody`]) plus four orthogonal status
//! flags. Chunks are shared through cheap reference-counted
//! [`ChunkHandle`]s; immutability (a one-way transition) is what makes
//! sharing safe, and mutators copy-on-write when a chunk is shared.
//!
//! The central operation is `peek`: a non-destructive read of a window of
//! a chunk, optionally converted to a requested representation
//! ([`ChunkTarget`]). Peeking slices, flattens, merges, or
//! deserializes-on-demand as needed; it never silently truncates — short
//! results carry the incomplete flag instead.

mod bytes;
mod fields;
mod iterator;
mod length;
mod sequence;
mod slice;

pub use bytes::BytesChunk;
pub use fields::{Fields, FieldsChunk};
pub use iterator::ChunkIterator;
pub use length::LengthChunk;
pub use sequence::SequenceChunk;
pub use slice::SliceChunk;

pub(crate) use sequence::build as build_sequence;

use std::any::{Any, TypeId};
use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::length::Bits;
use crate::serializer;
use crate::stream::{ByteInputStream, ByteOutputStream};

const FLAG_IMMUTABLE: u8 = 0b0001;
const FLAG_INCOMPLETE: u8 = 0b0010;
const FLAG_INCORRECT: u8 = 0b0100;
const FLAG_IMPROPER: u8 = 0b1000;

/// The closed set of chunk representations.
#[derive(Debug, Clone)]
pub enum ChunkBody {
    /// Zero length; the neutral element.
    Empty,
    /// Known length, unspecified contents.
    Length(LengthChunk),
    /// Owned octets.
    Bytes(BytesChunk),
    /// A user-defined record with named fields.
    Fields(FieldsChunk),
    /// A referenced window over another chunk.
    Slice(SliceChunk),
    /// A flat concatenation of inner chunks.
    Sequence(SequenceChunk),
}

/// A contiguous region of protocol data.
///
/// Status flags live in a [`Cell`] so they can be set through shared
/// handles: marking a chunk immutable, incomplete, incorrect or
/// improperly represented never requires exclusive ownership. Everything
/// else does.
#[derive(Debug, Clone)]
pub struct Chunk {
    flags: Cell<u8>,
    body: ChunkBody,
}

impl Chunk {
    fn new(body: ChunkBody) -> Self {
        Self {
            flags: Cell::new(0),
            body,
        }
    }

    /// The representation variant.
    pub fn body(&self) -> &ChunkBody {
        &self.body
    }

    /// Variant name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.body {
            ChunkBody::Empty => "empty",
            ChunkBody::Length(_) => "length",
            ChunkBody::Bytes(_) => "bytes",
            ChunkBody::Fields(_) => "fields",
            ChunkBody::Slice(_) => "slice",
            ChunkBody::Sequence(_) => "sequence",
        }
    }

    /// Total length of this chunk, in bits.
    pub fn length(&self) -> Bits {
        match &self.body {
            ChunkBody::Empty => Bits::ZERO,
            ChunkBody::Length(c) => c.length(),
            ChunkBody::Bytes(c) => c.length(),
            ChunkBody::Fields(c) => c.length(),
            ChunkBody::Slice(c) => c.length(),
            ChunkBody::Sequence(c) => c.length(),
        }
    }

    fn flag(&self, mask: u8) -> bool {
        self.flags.get() & mask != 0
    }

    fn set_flag(&self, mask: u8) {
        self.flags.set(self.flags.get() | mask);
    }

    pub fn is_mutable(&self) -> bool {
        !self.flag(FLAG_IMMUTABLE)
    }

    pub fn is_immutable(&self) -> bool {
        self.flag(FLAG_IMMUTABLE)
    }

    /// One-way transition to the immutable state. Recurses into slice and
    /// sequence inners, freezing the whole structure.
    pub fn make_immutable(&self) {
        self.set_flag(FLAG_IMMUTABLE);
        match &self.body {
            ChunkBody::Slice(slice) => slice.inner().make_immutable(),
            ChunkBody::Sequence(sequence) => {
                for chunk in sequence.chunks() {
                    chunk.make_immutable();
                }
            }
            _ => {}
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.flag(FLAG_INCOMPLETE)
    }

    pub fn is_incomplete(&self) -> bool {
        self.flag(FLAG_INCOMPLETE)
    }

    /// Mark this chunk as a fragment of a larger logical chunk.
    pub fn mark_incomplete(&self) {
        self.set_flag(FLAG_INCOMPLETE);
    }

    pub fn is_correct(&self) -> bool {
        !self.flag(FLAG_INCORRECT)
    }

    pub fn is_incorrect(&self) -> bool {
        self.flag(FLAG_INCORRECT)
    }

    /// Mark this chunk as carrying bit errors. Propagated, never cleared.
    pub fn mark_incorrect(&self) {
        self.set_flag(FLAG_INCORRECT);
    }

    pub fn is_properly_represented(&self) -> bool {
        !self.flag(FLAG_IMPROPER)
    }

    pub fn is_improperly_represented(&self) -> bool {
        self.flag(FLAG_IMPROPER)
    }

    /// Mark this chunk as deserialized from bytes that do not satisfy its
    /// schema.
    pub fn mark_improperly_represented(&self) {
        self.set_flag(FLAG_IMPROPER);
    }

    /// Copy incomplete/incorrect/improper flags from `source` onto this
    /// chunk (flags accumulate; none are cleared).
    pub(crate) fn inherit_soft_flags(&self, source: &Chunk) {
        self.flags.set(self.flags.get() | source.soft_flags());
    }

    pub(crate) fn soft_flags(&self) -> u8 {
        const SOFT: u8 = FLAG_INCOMPLETE | FLAG_INCORRECT | FLAG_IMPROPER;
        self.flags.get() & SOFT
    }

    /// Downcast accessors for the representation variants.
    pub fn as_bytes_chunk(&self) -> Option<&BytesChunk> {
        match &self.body {
            ChunkBody::Bytes(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_length_chunk(&self) -> Option<&LengthChunk> {
        match &self.body {
            ChunkBody::Length(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_slice_chunk(&self) -> Option<&SliceChunk> {
        match &self.body {
            ChunkBody::Slice(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_sequence_chunk(&self) -> Option<&SequenceChunk> {
        match &self.body {
            ChunkBody::Sequence(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_fields_chunk(&self) -> Option<&FieldsChunk> {
        match &self.body {
            ChunkBody::Fields(c) => Some(c),
            _ => None,
        }
    }

    /// Downcast to a concrete field record.
    pub fn as_fields<T: Fields>(&self) -> Option<&T> {
        self.as_fields_chunk().and_then(FieldsChunk::get)
    }

    /// Whether this chunk already satisfies the requested representation.
    pub fn matches(&self, target: &ChunkTarget) -> bool {
        match (&self.body, target) {
            (ChunkBody::Length(_), ChunkTarget::Length) => true,
            (ChunkBody::Bytes(_), ChunkTarget::Bytes) => true,
            (ChunkBody::Fields(f), ChunkTarget::Fields { id, .. }) => f.fields().represents(*id),
            _ => false,
        }
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind_name(), self.length())
    }
}

/// Names the representation a typed peek requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkTarget {
    /// A length-only placeholder.
    Length,
    /// Serialized octets.
    Bytes,
    /// A field record satisfying the given type id.
    Fields { id: TypeId, name: &'static str },
}

impl ChunkTarget {
    /// Target for a field record type (or an abstract family marker).
    pub fn of<T: Any>() -> Self {
        ChunkTarget::Fields {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

/// Maps a type to the peek target it requests, so callers write
/// `peek_as::<MyHeader>(..)`. Implemented by the built-in
/// [`BytesChunk`]/[`LengthChunk`] and by user field records (and abstract
/// family markers) via [`ChunkTarget::of`].
pub trait ChunkType: 'static {
    fn target() -> ChunkTarget;
}

/// A shared, reference-counted chunk.
///
/// Cloning a handle shares the chunk; mutating through a handle requires
/// the chunk to be mutable and clones first when the chunk is shared
/// (copy-on-write).
#[derive(Debug, Clone)]
pub struct ChunkHandle(Rc<Chunk>);

impl Deref for ChunkHandle {
    type Target = Chunk;

    fn deref(&self) -> &Chunk {
        &self.0
    }
}

impl From<Chunk> for ChunkHandle {
    fn from(chunk: Chunk) -> Self {
        Self(Rc::new(chunk))
    }
}

impl From<LengthChunk> for ChunkHandle {
    fn from(chunk: LengthChunk) -> Self {
        Chunk::new(ChunkBody::Length(chunk)).into()
    }
}

impl From<BytesChunk> for ChunkHandle {
    fn from(chunk: BytesChunk) -> Self {
        Chunk::new(ChunkBody::Bytes(chunk)).into()
    }
}

impl From<SequenceChunk> for ChunkHandle {
    fn from(chunk: SequenceChunk) -> Self {
        Chunk::new(ChunkBody::Sequence(chunk)).into()
    }
}

impl From<FieldsChunk> for ChunkHandle {
    fn from(chunk: FieldsChunk) -> Self {
        Chunk::new(ChunkBody::Fields(chunk)).into()
    }
}

impl fmt::Display for ChunkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl ChunkHandle {
    /// The zero-length neutral chunk. Always immutable.
    pub fn empty() -> Self {
        let chunk = Chunk::new(ChunkBody::Empty);
        chunk.make_immutable();
        chunk.into()
    }

    /// A fresh length-only chunk.
    pub fn from_length(length: Bits) -> Self {
        LengthChunk::new(length).into()
    }

    /// A fresh byte-array chunk.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        BytesChunk::new(bytes).into()
    }

    /// A fresh field record chunk.
    pub fn from_fields(fields: impl Fields) -> Self {
        FieldsChunk::new(fields).into()
    }

    /// A window over `inner`, which must be immutable. A window over a
    /// slice composes offsets so slices never nest.
    pub fn from_slice(inner: &ChunkHandle, offset: Bits, length: Bits) -> Result<Self> {
        if inner.is_mutable() {
            return Err(Error::MutableChunk {
                operation: "slicing",
            });
        }
        if offset + length > inner.length() {
            return Err(Error::OffsetOutOfRange {
                offset: offset + length,
                length: inner.length(),
            });
        }
        Ok(match inner.body() {
            ChunkBody::Slice(nested) => {
                Self::slice_unchecked(nested.inner().clone(), nested.offset() + offset, length)
            }
            _ => Self::slice_unchecked(inner.clone(), offset, length),
        })
    }

    /// Build a chunk from parts: flatten, merge, collapse.
    pub fn from_sequence(parts: impl IntoIterator<Item = ChunkHandle>) -> Self {
        build_sequence(parts)
    }

    pub(crate) fn slice_unchecked(inner: ChunkHandle, offset: Bits, length: Bits) -> Self {
        Chunk::new(ChunkBody::Slice(SliceChunk::new(inner, offset, length))).into()
    }

    /// Whether two handles refer to the same chunk instance.
    pub fn ptr_eq(&self, other: &ChunkHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of handles sharing this chunk.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// A fresh chunk with the same body and flags, under a new handle.
    pub(crate) fn duplicate(&self) -> ChunkHandle {
        ChunkHandle(Rc::new((*self.0).clone()))
    }

    /// A mutable deep-enough copy: same representation, immutability
    /// cleared, soft flags preserved. Inner chunks of slices and sequences
    /// stay shared (they are immutable).
    pub fn clone_mutable(&self) -> ChunkHandle {
        let chunk = (*self.0).clone();
        chunk.flags.set(chunk.flags.get() & !FLAG_IMMUTABLE);
        chunk.into()
    }

    /// Exclusive access for mutation. Fails on immutable chunks; clones
    /// first when the chunk is shared.
    pub fn make_mut(&mut self) -> Result<&mut Chunk> {
        if self.is_immutable() {
            return Err(Error::ImmutableChunk {
                kind: self.kind_name(),
            });
        }
        Ok(Rc::make_mut(&mut self.0))
    }

    /// Mutable access to the byte-array representation.
    pub fn bytes_chunk_mut(&mut self) -> Result<&mut BytesChunk> {
        let found = self.kind_name();
        match &mut self.make_mut()?.body {
            ChunkBody::Bytes(chunk) => Ok(chunk),
            _ => Err(Error::UnexpectedChunkKind {
                expected: "bytes",
                found,
            }),
        }
    }

    /// Mutable access to a concrete field record. Invalidates the
    /// serialization cache.
    pub fn fields_mut<T: Fields>(&mut self) -> Result<&mut T> {
        let found = self.kind_name();
        match &mut self.make_mut()?.body {
            ChunkBody::Fields(chunk) => chunk.get_mut().ok_or(Error::UnexpectedChunkKind {
                expected: std::any::type_name::<T>(),
                found: "fields",
            }),
            _ => Err(Error::UnexpectedChunkKind {
                expected: "fields",
                found,
            }),
        }
    }

    /// Mutable access to the sequence representation.
    pub fn sequence_mut(&mut self) -> Result<&mut SequenceChunk> {
        let found = self.kind_name();
        match &mut self.make_mut()?.body {
            ChunkBody::Sequence(chunk) => Ok(chunk),
            _ => Err(Error::UnexpectedChunkKind {
                expected: "sequence",
                found,
            }),
        }
    }

    /// Advance an iterator over this chunk by `by` bits, keeping the
    /// element index hint when the move lands on the next boundary.
    pub fn move_iterator(&self, iterator: &mut ChunkIterator, by: Bits) {
        let old_index = iterator.index();
        iterator.advance(by);
        match self.body() {
            ChunkBody::Sequence(sequence) => {
                let next = old_index.and_then(|i| {
                    let element = sequence.element(i, iterator.is_forward())?;
                    (element.length() == by).then_some(i + 1)
                });
                iterator.set_index(next);
            }
            _ => iterator.set_index((iterator.position() == Bits::ZERO).then_some(0)),
        }
    }

    /// Non-destructive read of a window of this chunk, in whatever
    /// representation falls out of the slicing algebra.
    ///
    /// `length: None` requests the default window — the rest of the chunk,
    /// or the next inner element when this is a sequence. A window clipped
    /// by the chunk's end comes back marked incomplete.
    pub fn peek(&self, iterator: &ChunkIterator, length: Option<Bits>) -> Result<ChunkHandle> {
        let total = self.length();
        if iterator.position() > total {
            return Err(Error::OffsetOutOfRange {
                offset: iterator.position(),
                length: total,
            });
        }
        match self.body() {
            ChunkBody::Sequence(sequence) => self.peek_sequence(sequence, iterator, length),
            _ => {
                let (start, len, clipped) = resolve_window(total, iterator, length);
                self.peek_window(start, len, clipped)
            }
        }
    }

    /// [`ChunkHandle::peek`] at an absolute offset from the start.
    pub fn peek_at(&self, offset: Bits, length: Option<Bits>) -> Result<ChunkHandle> {
        self.peek(&ChunkIterator::forward(offset), length)
    }

    /// Typed peek: deliver the window as a `T`, slicing, merging or
    /// deserializing on demand. `Ok(None)` means the window cannot be
    /// represented as `T`.
    pub fn peek_as<T: ChunkType>(
        &self,
        iterator: &ChunkIterator,
        length: Option<Bits>,
    ) -> Result<Option<ChunkHandle>> {
        let raw = self.peek(iterator, length)?;
        convert(raw, &T::target())
    }

    /// [`ChunkHandle::peek_as`] at an absolute offset from the start.
    pub fn peek_as_at<T: ChunkType>(
        &self,
        offset: Bits,
        length: Option<Bits>,
    ) -> Result<Option<ChunkHandle>> {
        self.peek_as::<T>(&ChunkIterator::forward(offset), length)
    }

    /// Peek a window of a leaf (non-sequence) chunk resolved to forward
    /// coordinates.
    fn peek_window(&self, start: Bits, len: Bits, clipped: bool) -> Result<ChunkHandle> {
        let total = self.length();
        if len == Bits::ZERO {
            return Ok(ChunkHandle::empty());
        }
        if start == Bits::ZERO && len == total && !clipped {
            return Ok(self.clone());
        }
        let result = match self.body() {
            ChunkBody::Empty | ChunkBody::Sequence(_) => unreachable!("handled by callers"),
            ChunkBody::Length(_) => {
                let chunk = ChunkHandle::from_length(len);
                chunk.inherit_soft_flags(self);
                if self.is_immutable() {
                    chunk.make_immutable();
                }
                chunk
            }
            ChunkBody::Bytes(bytes) => {
                let from = start.byte_count()?;
                let to = from + len.byte_count()?;
                let chunk = ChunkHandle::from_bytes(bytes.bytes()[from..to].to_vec());
                chunk.inherit_soft_flags(self);
                if self.is_immutable() {
                    chunk.make_immutable();
                }
                chunk
            }
            ChunkBody::Fields(_) => {
                let chunk = ChunkHandle::from_slice(self, start, len)?;
                chunk.inherit_soft_flags(self);
                chunk.make_immutable();
                chunk
            }
            ChunkBody::Slice(slice) => {
                let inner = slice.inner().clone();
                let chunk = inner.peek_at(slice.offset() + start, Some(len))?;
                inherit_flags_owned(chunk, self)
            }
        };
        if clipped {
            return Ok(mark_incomplete_owned(result));
        }
        Ok(result)
    }

    fn peek_sequence(
        &self,
        sequence: &SequenceChunk,
        iterator: &ChunkIterator,
        length: Option<Bits>,
    ) -> Result<ChunkHandle> {
        let total = self.length();
        let position = iterator.position();

        if iterator.is_forward() {
            let start = position;
            let located = iterator
                .index()
                .and_then(|i| sequence.chunks().get(i).map(|_| (i, start)))
                .or_else(|| sequence.locate_forward(start));
            match length {
                Some(len) => self.peek_sequence_window(sequence, start, len, located),
                None => {
                    // Default: the rest of the current element.
                    let Some((index, element_start)) = located else {
                        return Ok(ChunkHandle::empty());
                    };
                    let element_len = sequence.chunks()[index].length();
                    let len = element_len - (start - element_start);
                    self.peek_sequence_window(sequence, start, len, Some((index, element_start)))
                }
            }
        } else {
            let end = total - position;
            match length {
                Some(len) => {
                    let clipped = len > end;
                    let want = len.min(end);
                    let start = end - want;
                    let located = sequence.locate_forward(start);
                    let result = self.peek_sequence_window(sequence, start, want, located)?;
                    if clipped {
                        return Ok(mark_incomplete_owned(result));
                    }
                    Ok(result)
                }
                None => {
                    // Default: the element ending at (or containing) the
                    // boundary, from its start.
                    let hinted = iterator.index().and_then(|i| {
                        let element = sequence.element(i, false)?;
                        let n = sequence.chunks().len();
                        Some((n - 1 - i, end - element.length()))
                    });
                    let Some((index, element_start)) =
                        hinted.or_else(|| sequence.locate_backward(end))
                    else {
                        return Ok(ChunkHandle::empty());
                    };
                    let len = end - element_start;
                    self.peek_sequence_window(sequence, element_start, len, Some((index, element_start)))
                }
            }
        }
    }

    /// Peek a forward window of a sequence: delegate when the window lies
    /// inside one element, otherwise collect covering peeks and rebuild
    /// (flatten + merge) the result.
    fn peek_sequence_window(
        &self,
        sequence: &SequenceChunk,
        start: Bits,
        len: Bits,
        located: Option<(usize, Bits)>,
    ) -> Result<ChunkHandle> {
        let total = self.length();
        let available = total.saturating_sub(start);
        let clipped = len > available;
        let len = len.min(available);
        if len == Bits::ZERO {
            return Ok(ChunkHandle::empty());
        }
        if start == Bits::ZERO && len == total && !clipped {
            return Ok(self.clone());
        }

        let (first, mut element_start) = match located {
            Some(found) => found,
            None => sequence.locate_forward(start).ok_or(Error::OffsetOutOfRange {
                offset: start,
                length: total,
            })?,
        };

        let mut parts: SmallVec<[ChunkHandle; 4]> = SmallVec::new();
        let mut cursor = start;
        let mut remaining = len;
        for element in &sequence.chunks()[first..] {
            if remaining == Bits::ZERO {
                break;
            }
            let offset = cursor - element_start;
            let take = (element.length() - offset).min(remaining);
            parts.push(element.peek_at(offset, Some(take))?);
            cursor += take;
            remaining -= take;
            element_start += element.length();
        }

        let result = if parts.len() == 1 {
            parts.pop().unwrap()
        } else {
            let built = build_sequence(parts);
            if self.is_immutable() {
                built.make_immutable();
            }
            built
        };
        let result = inherit_flags_owned(result, self);
        if clipped {
            return Ok(mark_incomplete_owned(result));
        }
        Ok(result)
    }
}

/// Set the incomplete flag, duplicating first when the chunk is shared so
/// a peeked identity result never taints the original instance.
fn mark_incomplete_owned(result: ChunkHandle) -> ChunkHandle {
    let owned = if result.handle_count() > 1 {
        result.duplicate()
    } else {
        result
    };
    owned.mark_incomplete();
    owned
}

/// Propagate soft flags from `source`, duplicating first when the result
/// is shared and would otherwise gain flags in place.
fn inherit_flags_owned(result: ChunkHandle, source: &Chunk) -> ChunkHandle {
    if source.soft_flags() & !result.soft_flags() == 0 {
        return result;
    }
    let owned = if result.handle_count() > 1 {
        result.duplicate()
    } else {
        result
    };
    owned.inherit_soft_flags(source);
    owned
}

/// Concatenate two immutable chunks into an immutable contents chunk
/// (flatten + merge). Insertion path shared by packets and queues.
pub(crate) fn concat(front: &ChunkHandle, back: &ChunkHandle) -> ChunkHandle {
    if front.length() == Bits::ZERO {
        return back.clone();
    }
    if back.length() == Bits::ZERO {
        return front.clone();
    }
    let joined = build_sequence([front.clone(), back.clone()]);
    joined.make_immutable();
    joined
}

/// Resolve an iterator plus requested length into forward coordinates
/// `(start, length, clipped)` for a leaf chunk.
fn resolve_window(total: Bits, iterator: &ChunkIterator, length: Option<Bits>) -> (Bits, Bits, bool) {
    if iterator.is_forward() {
        let start = iterator.position();
        let available = total - start;
        let want = length.unwrap_or(available);
        (start, want.min(available), want > available)
    } else {
        let end = total - iterator.position();
        let want = length.unwrap_or(end);
        let len = want.min(end);
        (end - len, len, want > end)
    }
}

/// Convert a peeked chunk to the requested representation, serializing and
/// deserializing on demand. `Ok(None)` means not representable.
fn convert(raw: ChunkHandle, target: &ChunkTarget) -> Result<Option<ChunkHandle>> {
    if raw.length() == Bits::ZERO || raw.matches(target) {
        return Ok(Some(raw));
    }
    match target {
        ChunkTarget::Length => {
            let chunk = ChunkHandle::from_length(raw.length());
            finish_conversion(&chunk, &raw);
            Ok(Some(chunk))
        }
        ChunkTarget::Bytes => {
            let mut out = ByteOutputStream::new();
            serializer::serialize(&mut out, &raw)?;
            let chunk = ChunkHandle::from_bytes(out.into_bytes().to_vec());
            finish_conversion(&chunk, &raw);
            Ok(Some(chunk))
        }
        ChunkTarget::Fields { .. } => {
            let mut out = ByteOutputStream::new();
            serializer::serialize(&mut out, &raw)?;
            let mut input = ByteInputStream::new(out.into_bytes());
            let chunk = match serializer::deserialize(&mut input, target) {
                Ok(chunk) => chunk,
                Err(Error::NoSerializerRegistered { type_name }) => {
                    return Err(Error::NoSerializerRegistered { type_name })
                }
                Err(_) => return Ok(None),
            };
            if input.is_read_beyond_end() || !chunk.matches(target) {
                return Ok(None);
            }
            finish_conversion(&chunk, &raw);
            Ok(Some(chunk))
        }
    }
}

fn finish_conversion(chunk: &ChunkHandle, raw: &ChunkHandle) {
    chunk.inherit_soft_flags(raw);
    if raw.is_immutable() {
        chunk.make_immutable();
    }
}
