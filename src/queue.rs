//! Stream-like FIFO of chunks.
//!
//! Producers push immutable chunks at the back; consumers pop typed views
//! from the front. Typed pops over fragments reassemble through the peek
//! engine: pushing two halves of a header and popping the header type
//! yields the merged record. Fully consumed contents are physically
//! dropped as the front iterator passes them.

use crate::chunk::{concat, ChunkHandle, ChunkIterator, ChunkType};
use crate::error::{Error, Result};
use crate::length::Bits;

/// FIFO of bytes produced by enqueuing chunks.
#[derive(Debug, Clone)]
pub struct ChunkQueue {
    contents: ChunkHandle,
    iterator: ChunkIterator,
    pushed_length: Bits,
    popped_length: Bits,
}

impl Default for ChunkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkQueue {
    pub fn new() -> Self {
        Self {
            contents: ChunkHandle::empty(),
            iterator: ChunkIterator::forward(Bits::ZERO),
            pushed_length: Bits::ZERO,
            popped_length: Bits::ZERO,
        }
    }

    /// Length currently queued (pushed minus popped).
    pub fn length(&self) -> Bits {
        self.contents.length() - self.iterator.position()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == Bits::ZERO
    }

    /// Total length ever pushed.
    pub fn pushed_length(&self) -> Bits {
        self.pushed_length
    }

    /// Total length ever popped.
    pub fn popped_length(&self) -> Bits {
        self.popped_length
    }

    /// Enqueue an immutable chunk at the back.
    pub fn push(&mut self, chunk: &ChunkHandle) -> Result<()> {
        if chunk.is_mutable() {
            return Err(Error::MutableChunk { operation: "push" });
        }
        self.pushed_length += chunk.length();
        self.contents = concat(&self.contents, chunk);
        self.iterator.seek(self.iterator.position());
        Ok(())
    }

    /// Peek the front of the queue without consuming.
    pub fn peek(&self, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.contents.peek(&self.iterator, length).map(Some)
    }

    /// Typed peek at the front.
    pub fn peek_as<T: ChunkType>(&self, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.contents.peek_as::<T>(&self.iterator, length)
    }

    /// Whether the front of the queue can be represented as `T`.
    pub fn has<T: ChunkType>(&self, length: Option<Bits>) -> Result<bool> {
        Ok(self.peek_as::<T>(length)?.is_some())
    }

    /// Dequeue the front of the queue.
    pub fn pop(&mut self, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        let popped = self.peek(length)?;
        if let Some(chunk) = &popped {
            self.consume(chunk.length())?;
        }
        Ok(popped)
    }

    /// Typed dequeue.
    pub fn pop_as<T: ChunkType>(&mut self, length: Option<Bits>) -> Result<Option<ChunkHandle>> {
        let popped = self.peek_as::<T>(length)?;
        if let Some(chunk) = &popped {
            self.consume(chunk.length())?;
        }
        Ok(popped)
    }

    /// Advance past `length` bits and drop the consumed prefix.
    fn consume(&mut self, length: Bits) -> Result<()> {
        self.contents.move_iterator(&mut self.iterator, length);
        self.popped_length += length;
        let position = self.iterator.position();
        let total = self.contents.length();
        self.contents = if position == total {
            ChunkHandle::empty()
        } else {
            let rest = self.contents.peek_at(position, Some(total - position))?;
            rest.make_immutable();
            rest
        };
        self.iterator.seek(Bits::ZERO);
        Ok(())
    }
}
