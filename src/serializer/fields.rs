//! Field-record serialization with representation caching.

use crate::chunk::{Chunk, ChunkHandle, Fields};
use crate::error::{Error, Result};
use crate::length::{bytes, Bits};
use crate::serializer::registry::ChunkSerializer;
use crate::serializer::{count_deserialized, count_serialized};
use crate::stream::{ByteInputStream, ByteOutputStream};

/// Typed encode/decode for one record schema.
///
/// Implementations write and read the whole record; windowing and cache
/// maintenance are supplied by [`FieldsChunkSerializer`]. A deserializer
/// may parse a truncated record gracefully: construct what is available,
/// set the record's length accordingly, and mark the returned chunk
/// incomplete. Reading past the end of the stream instead makes the typed
/// peek reject the result.
pub trait FieldsSerializer: 'static {
    fn serialize_fields(&self, stream: &mut ByteOutputStream, fields: &dyn Fields) -> Result<()>;

    fn deserialize_fields(&self, stream: &mut ByteInputStream) -> Result<ChunkHandle>;
}

/// Adapter wrapping a [`FieldsSerializer`] with the cache discipline:
///
/// - cached bytes are replayed without re-encoding and without counting
///   toward telemetry;
/// - a first whole-chunk serialization populates the cache in passing;
/// - a partial window encodes to a scratch stream, emits the window, and
///   populates the cache;
/// - deserialization stores the consumed bytes as the cache.
///
/// Mutating the record through its handle clears the cache.
pub struct FieldsChunkSerializer<S>(pub S);

impl<S: FieldsSerializer> ChunkSerializer for FieldsChunkSerializer<S> {
    fn serialize(
        &self,
        stream: &mut ByteOutputStream,
        chunk: &Chunk,
        offset: Bits,
        length: Option<Bits>,
    ) -> Result<()> {
        let fields_chunk = chunk.as_fields_chunk().ok_or(Error::UnexpectedChunkKind {
            expected: "fields",
            found: chunk.kind_name(),
        })?;
        let total = chunk.length();
        let span = length.unwrap_or(total - offset);

        if let Some(cached) = fields_chunk.serialized() {
            let from = offset.byte_count()?;
            let count = span.byte_count()?;
            stream.write_bytes(&cached[from..from + count]);
            return Ok(());
        }

        if offset == Bits::ZERO && span == total {
            let start = stream.position();
            self.0.serialize_fields(stream, fields_chunk.fields())?;
            let written = stream.position() - start;
            count_serialized(bytes(written as u64));
            fields_chunk.set_serialized(stream.copy_bytes(start..start + written));
        } else {
            let mut scratch = ByteOutputStream::new();
            self.0.serialize_fields(&mut scratch, fields_chunk.fields())?;
            count_serialized(bytes(scratch.len() as u64));
            let whole = scratch.into_bytes();
            let from = offset.byte_count()?;
            let count = span.byte_count()?;
            stream.write_bytes(&whole[from..from + count]);
            fields_chunk.set_serialized(whole);
        }
        Ok(())
    }

    fn deserialize(&self, stream: &mut ByteInputStream) -> Result<ChunkHandle> {
        let start = stream.position();
        let chunk = self.0.deserialize_fields(stream)?;
        let consumed = stream.position() - start;
        count_deserialized(bytes(consumed as u64));
        if let Some(fields_chunk) = chunk.as_fields_chunk() {
            fields_chunk.set_serialized(stream.copy_bytes(start..start + consumed));
        }
        Ok(chunk)
    }
}
