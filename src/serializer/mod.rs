//! Serialization between chunks and byte streams.
//!
//! The built-in representations serialize structurally: length chunks as
//! a repeated fill byte, byte chunks as their octets, slices by recursing
//! into their inner chunk with composed offsets, sequences element by
//! element with windows clipped at the boundaries. Field records go
//! through the serializer registered for their concrete type (see
//! [`register_serializer`]), wrapped in the caching adapter
//! [`FieldsChunkSerializer`].
//!
//! Process-wide counters track how many bits were actually encoded or
//! decoded; cached replays are free.

mod fields;
mod registry;

pub use fields::{FieldsChunkSerializer, FieldsSerializer};
pub use registry::{register_serializer, ChunkSerializer};

pub(crate) use registry::serializer_for;

use std::cell::Cell;

use crate::chunk::{Chunk, ChunkBody, ChunkHandle, ChunkTarget, ChunkType, LengthChunk};
use crate::error::{Error, Result};
use crate::length::{bits, bytes, Bits};
use crate::stream::{ByteInputStream, ByteOutputStream};

thread_local! {
    static SERIALIZED_BITS: Cell<u64> = const { Cell::new(0) };
    static DESERIALIZED_BITS: Cell<u64> = const { Cell::new(0) };
}

/// Total bits encoded so far in this process (cached replays excluded).
pub fn total_serialized_bits() -> Bits {
    bits(SERIALIZED_BITS.with(Cell::get))
}

/// Total bits decoded so far in this process.
pub fn total_deserialized_bits() -> Bits {
    bits(DESERIALIZED_BITS.with(Cell::get))
}

pub(crate) fn count_serialized(amount: Bits) {
    SERIALIZED_BITS.with(|counter| counter.set(counter.get() + amount.get()));
}

pub(crate) fn count_deserialized(amount: Bits) {
    DESERIALIZED_BITS.with(|counter| counter.set(counter.get() + amount.get()));
}

/// Serialize a whole chunk.
pub fn serialize(stream: &mut ByteOutputStream, chunk: &Chunk) -> Result<()> {
    serialize_window(stream, chunk, Bits::ZERO, None)
}

/// Serialize a window of a chunk. A `None` length means to the end.
pub fn serialize_window(
    stream: &mut ByteOutputStream,
    chunk: &Chunk,
    offset: Bits,
    length: Option<Bits>,
) -> Result<()> {
    let total = chunk.length();
    if offset > total {
        return Err(Error::OffsetOutOfRange {
            offset,
            length: total,
        });
    }
    let span = length.unwrap_or(total - offset);
    if offset + span > total {
        return Err(Error::OffsetOutOfRange {
            offset: offset + span,
            length: total,
        });
    }

    match chunk.body() {
        ChunkBody::Empty => Ok(()),
        ChunkBody::Length(_) => {
            stream.write_byte_repeatedly(LengthChunk::FILL_BYTE, span.byte_count()?);
            count_serialized(span);
            Ok(())
        }
        ChunkBody::Bytes(inner) => {
            let from = offset.byte_count()?;
            let count = span.byte_count()?;
            stream.write_bytes(&inner.bytes()[from..from + count]);
            count_serialized(span);
            Ok(())
        }
        ChunkBody::Slice(slice) => {
            serialize_window(stream, slice.inner(), slice.offset() + offset, Some(span))
        }
        ChunkBody::Sequence(sequence) => {
            let begin = offset;
            let end = offset + span;
            let mut cursor = Bits::ZERO;
            for element in sequence.chunks() {
                let element_begin = cursor;
                let element_end = cursor + element.length();
                if begin <= element_begin && element_end <= end {
                    serialize(stream, element)?;
                } else if element_begin < begin && begin < element_end {
                    // Window starts (and possibly ends) inside this element.
                    let until = end.min(element_end);
                    serialize_window(stream, element, begin - element_begin, Some(until - begin))?;
                } else if element_begin < end && end < element_end && begin <= element_begin {
                    serialize_window(stream, element, Bits::ZERO, Some(end - element_begin))?;
                }
                cursor = element_end;
            }
            Ok(())
        }
        ChunkBody::Fields(record) => {
            let id = record.fields().as_any().type_id();
            let serializer = serializer_for(id).ok_or(Error::NoSerializerRegistered {
                type_name: record.fields().type_name(),
            })?;
            serializer.serialize(stream, chunk, offset, length)
        }
    }
}

/// Deserialize a chunk of the requested representation from a stream.
///
/// Bytes and length targets consume the remaining stream; field targets
/// dispatch to the registered serializer. A read past the end of the
/// stream leaves the stream's sticky beyond-end flag set — the typed peek
/// engine rejects such results, other callers may inspect the flag
/// themselves.
pub fn deserialize(stream: &mut ByteInputStream, target: &ChunkTarget) -> Result<ChunkHandle> {
    match target {
        ChunkTarget::Bytes => {
            let count = stream.remaining();
            let data = stream.read_bytes(count);
            count_deserialized(bytes(count as u64));
            Ok(ChunkHandle::from_bytes(data.to_vec()))
        }
        ChunkTarget::Length => {
            let count = stream.remaining();
            stream.read_bytes(count);
            count_deserialized(bytes(count as u64));
            Ok(ChunkHandle::from_length(bytes(count as u64)))
        }
        ChunkTarget::Fields { id, name } => {
            let serializer =
                serializer_for(*id).ok_or(Error::NoSerializerRegistered { type_name: name })?;
            serializer.deserialize(stream)
        }
    }
}

/// [`deserialize`] with the target named by a type parameter.
pub fn deserialize_as<T: ChunkType>(stream: &mut ByteInputStream) -> Result<ChunkHandle> {
    deserialize(stream, &T::target())
}
