//! Packets: a contents chunk with header and trailer pop iterators.
//!
//! A packet owns a single root chunk and two positions into it: the
//! header pop offset (from the start) and the trailer pop offset (from
//! the end). Protocol layers push headers and trailers while a packet is
//! being built, then pop them while it is being processed; the region
//! between the two offsets is the data region. Because contents are
//! immutable, duplicating a packet shares the chunks and only copies the
//! offsets.

use crate::chunk::{concat, ChunkHandle, ChunkIterator, ChunkType};
use crate::error::{Error, Result};
use crate::length::Bits;

/// A network packet, datagram or frame represented as chunks.
#[derive(Debug, Clone)]
pub struct Packet {
    contents: ChunkHandle,
    header_iterator: ChunkIterator,
    trailer_iterator: ChunkIterator,
}

impl Default for Packet {
    fn default() -> Self {
        Self::new()
    }
}

impl Packet {
    /// An empty packet.
    pub fn new() -> Self {
        Self {
            contents: ChunkHandle::empty(),
            header_iterator: ChunkIterator::forward(Bits::ZERO),
            trailer_iterator: ChunkIterator::backward(Bits::ZERO),
        }
    }

    /// A packet over existing contents, which must be immutable.
    pub fn from_contents(contents: ChunkHandle) -> Result<Self> {
        if contents.is_mutable() {
            return Err(Error::MutableChunk {
                operation: "packet construction",
            });
        }
        Ok(Self {
            contents,
            header_iterator: ChunkIterator::forward(Bits::ZERO),
            trailer_iterator: ChunkIterator::backward(Bits::ZERO),
        })
    }

    /// The root contents chunk.
    pub fn contents(&self) -> &ChunkHandle {
        &self.contents
    }

    /// Total packet length.
    pub fn length(&self) -> Bits {
        self.contents.length()
    }

    /// Header pop offset: how much has been popped from the front.
    pub fn header_pop_offset(&self) -> Bits {
        self.header_iterator.position()
    }

    /// Trailer pop offset: how much has been popped from the back.
    pub fn trailer_pop_offset(&self) -> Bits {
        self.trailer_iterator.position()
    }

    /// Length of the data region between the two pop offsets. Zero when
    /// pops from both ends have consumed the whole contents.
    pub fn data_length(&self) -> Bits {
        self.length()
            .saturating_sub(self.header_pop_offset())
            .saturating_sub(self.trailer_pop_offset())
    }

    /// Move the header pop offset. The offsets may never cross.
    pub fn set_header_pop_offset(&mut self, offset: Bits) -> Result<()> {
        if offset + self.trailer_pop_offset() > self.length() {
            return Err(Error::OffsetOutOfRange {
                offset,
                length: self.length() - self.trailer_pop_offset(),
            });
        }
        self.header_iterator.seek(offset);
        Ok(())
    }

    /// Move the trailer pop offset. The offsets may never cross.
    pub fn set_trailer_pop_offset(&mut self, offset: Bits) -> Result<()> {
        if self.header_pop_offset() + offset > self.length() {
            return Err(Error::OffsetOutOfRange {
                offset,
                length: self.length() - self.header_pop_offset(),
            });
        }
        self.trailer_iterator.seek(offset);
        Ok(())
    }

    /// A packet sharing the same contents, with its own pop offsets.
    pub fn dup(&self) -> Packet {
        self.clone()
    }

    fn check_insertable(chunk: &ChunkHandle, operation: &'static str) -> Result<()> {
        if chunk.is_mutable() {
            return Err(Error::MutableChunk { operation });
        }
        Ok(())
    }

    /// After the contents chunk is rebuilt, element index hints no longer
    /// refer to its structure; re-seeking keeps positions and drops hints.
    fn refresh_iterators(&mut self) {
        self.header_iterator.seek(self.header_iterator.position());
        self.trailer_iterator.seek(self.trailer_iterator.position());
    }

    /// Insert an immutable chunk at the front. Requires the header pop
    /// offset at zero.
    pub fn prepend(&mut self, chunk: &ChunkHandle) -> Result<()> {
        Self::check_insertable(chunk, "prepend")?;
        if self.header_pop_offset() != Bits::ZERO {
            return Err(Error::IteratorNotAtStart {
                operation: "prepend",
                end: "header",
            });
        }
        self.contents = concat(chunk, &self.contents);
        self.refresh_iterators();
        Ok(())
    }

    /// Insert an immutable chunk at the back. Requires the trailer pop
    /// offset at zero.
    pub fn append(&mut self, chunk: &ChunkHandle) -> Result<()> {
        Self::check_insertable(chunk, "append")?;
        if self.trailer_pop_offset() != Bits::ZERO {
            return Err(Error::IteratorNotAtStart {
                operation: "append",
                end: "trailer",
            });
        }
        self.contents = concat(&self.contents, chunk);
        self.refresh_iterators();
        Ok(())
    }

    /// Alias for [`Packet::prepend`].
    pub fn push_header(&mut self, chunk: &ChunkHandle) -> Result<()> {
        self.prepend(chunk)
    }

    /// Alias for [`Packet::append`].
    pub fn push_trailer(&mut self, chunk: &ChunkHandle) -> Result<()> {
        self.append(chunk)
    }

    /// Peek the next header without advancing. `None` once everything in
    /// front of the data region has been popped.
    pub fn peek_header(&self, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        if self.header_pop_offset() == self.length() {
            return Ok(None);
        }
        self.contents.peek(&self.header_iterator, length).map(Some)
    }

    /// Typed peek at the front. `None` when the region cannot be
    /// represented as `T`.
    pub fn peek_header_as<T: ChunkType>(&self, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        if self.header_pop_offset() == self.length() {
            return Ok(None);
        }
        self.contents.peek_as::<T>(&self.header_iterator, length)
    }

    /// Pop the next header: peek, then advance the header pop offset by
    /// the returned chunk's length.
    pub fn pop_header(&mut self, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        let popped = self.peek_header(length)?;
        if let Some(chunk) = &popped {
            self.contents
                .move_iterator(&mut self.header_iterator, chunk.length());
        }
        Ok(popped)
    }

    /// Typed pop at the front.
    pub fn pop_header_as<T: ChunkType>(&mut self, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        let popped = self.peek_header_as::<T>(length)?;
        if let Some(chunk) = &popped {
            self.contents
                .move_iterator(&mut self.header_iterator, chunk.length());
        }
        Ok(popped)
    }

    /// Whether the front can be represented as `T`.
    pub fn has_header<T: ChunkType>(&self, length: Option<Bits>) -> Result<bool> {
        Ok(self.peek_header_as::<T>(length)?.is_some())
    }

    /// Peek the next trailer without advancing.
    pub fn peek_trailer(&self, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        if self.trailer_pop_offset() == self.length() {
            return Ok(None);
        }
        self.contents.peek(&self.trailer_iterator, length).map(Some)
    }

    /// Typed peek at the back.
    pub fn peek_trailer_as<T: ChunkType>(&self, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        if self.trailer_pop_offset() == self.length() {
            return Ok(None);
        }
        self.contents.peek_as::<T>(&self.trailer_iterator, length)
    }

    /// Pop the next trailer: peek, then advance the trailer pop offset.
    pub fn pop_trailer(&mut self, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        let popped = self.peek_trailer(length)?;
        if let Some(chunk) = &popped {
            self.contents
                .move_iterator(&mut self.trailer_iterator, chunk.length());
        }
        Ok(popped)
    }

    /// Typed pop at the back.
    pub fn pop_trailer_as<T: ChunkType>(&mut self, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        let popped = self.peek_trailer_as::<T>(length)?;
        if let Some(chunk) = &popped {
            self.contents
                .move_iterator(&mut self.trailer_iterator, chunk.length());
        }
        Ok(popped)
    }

    /// Whether the back can be represented as `T`.
    pub fn has_trailer<T: ChunkType>(&self, length: Option<Bits>) -> Result<bool> {
        Ok(self.peek_trailer_as::<T>(length)?.is_some())
    }

    /// Peek at the start of the data region.
    pub fn peek_data(&self, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        self.peek_data_at(Bits::ZERO, length)
    }

    /// Typed peek at the start of the data region.
    pub fn peek_data_as<T: ChunkType>(&self, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        self.peek_data_at_as::<T>(Bits::ZERO, length)
    }

    /// Peek within the data region, `offset` relative to its start.
    pub fn peek_data_at(&self, offset: Bits, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        if offset > self.data_length() {
            return Err(Error::OffsetOutOfRange {
                offset,
                length: self.data_length(),
            });
        }
        if self.data_length() == Bits::ZERO {
            return Ok(None);
        }
        self.contents
            .peek_at(self.header_pop_offset() + offset, length)
            .map(Some)
    }

    /// Typed peek within the data region.
    pub fn peek_data_at_as<T: ChunkType>(
        &self,
        offset: Bits,
        length: Option<Bits>,
    ) -> Result<Option<ChunkHandle>> {
        if offset > self.data_length() {
            return Err(Error::OffsetOutOfRange {
                offset,
                length: self.data_length(),
            });
        }
        if self.data_length() == Bits::ZERO {
            return Ok(None);
        }
        self.contents
            .peek_as_at::<T>(self.header_pop_offset() + offset, length)
    }

    /// Whether the data region can be represented as `T`.
    pub fn has_data<T: ChunkType>(&self, length: Option<Bits>) -> Result<bool> {
        Ok(self.peek_data_as::<T>(length)?.is_some())
    }

    /// Peek anywhere in the contents, ignoring the pop offsets.
    pub fn peek_at(&self, offset: Bits, length: Option<Bits>) -> Result<ChunkHandle> {
        self.contents.peek_at(offset, length)
    }

    /// Typed peek anywhere in the contents.
    pub fn peek_at_as<T: ChunkType>(
        &self,
        offset: Bits,
        length: Option<Bits>,
    ) -> Result<Option<ChunkHandle>> {
        self.contents.peek_as_at::<T>(offset, length)
    }

    /// Physically trim the front of the contents. Only permitted while the
    /// header pop offset is zero.
    pub fn remove_from_beginning(&mut self, length: Bits) -> Result<()> {
        if self.header_pop_offset() != Bits::ZERO {
            return Err(Error::IteratorNotAtStart {
                operation: "remove_from_beginning",
                end: "header",
            });
        }
        self.trim_front(length)
    }

    /// Physically trim the back of the contents. Only permitted while the
    /// trailer pop offset is zero.
    pub fn remove_from_end(&mut self, length: Bits) -> Result<()> {
        if self.trailer_pop_offset() != Bits::ZERO {
            return Err(Error::IteratorNotAtStart {
                operation: "remove_from_end",
                end: "trailer",
            });
        }
        let total = self.length();
        if length > total {
            return Err(Error::OffsetOutOfRange {
                offset: length,
                length: total,
            });
        }
        self.contents = if length == total {
            ChunkHandle::empty()
        } else {
            let trimmed = self.contents.peek_at(Bits::ZERO, Some(total - length))?;
            trimmed.make_immutable();
            trimmed
        };
        self.refresh_iterators();
        Ok(())
    }

    /// Drop everything the header pop offset has passed over and reset it
    /// to zero.
    pub fn remove_popped_headers(&mut self) -> Result<()> {
        let popped = self.header_pop_offset();
        if popped > Bits::ZERO {
            self.header_iterator.seek(Bits::ZERO);
            self.trim_front(popped)?;
        }
        Ok(())
    }

    /// Drop everything the trailer pop offset has passed over and reset it
    /// to zero.
    pub fn remove_popped_trailers(&mut self) -> Result<()> {
        let popped = self.trailer_pop_offset();
        if popped > Bits::ZERO {
            self.trailer_iterator.seek(Bits::ZERO);
            self.remove_from_end(popped)?;
        }
        Ok(())
    }

    fn trim_front(&mut self, length: Bits) -> Result<()> {
        let total = self.length();
        if length > total {
            return Err(Error::OffsetOutOfRange {
                offset: length,
                length: total,
            });
        }
        self.contents = if length == total {
            ChunkHandle::empty()
        } else {
            let trimmed = self.contents.peek_at(length, Some(total - length))?;
            trimmed.make_immutable();
            trimmed
        };
        self.refresh_iterators();
        Ok(())
    }
}
