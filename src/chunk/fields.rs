//! User-defined field record chunks.
//!
//! Protocol layers describe their headers and trailers as types
//! implementing [`Fields`]. The chunk machinery stores them behind
//! [`FieldsChunk`], which also carries the cached serialized
//! representation maintained by the serializer layer.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;

use bytes::Bytes;

use crate::length::Bits;

/// A typed protocol record stored inside a chunk.
///
/// Implementors describe one header/trailer schema: its serialized length,
/// how to clone it, and which requested type ids it satisfies. A concrete
/// record usually also implements [`ChunkType`](crate::chunk::ChunkType)
/// so it can be requested from typed peeks, and has a
/// [`FieldsSerializer`](crate::serializer::FieldsSerializer) registered
/// for the bytes representation.
pub trait Fields: Any + fmt::Debug {
    /// Total length of the record on the wire.
    fn chunk_length(&self) -> Bits;

    /// Short name used in diagnostics.
    fn type_name(&self) -> &'static str;

    /// Whether this record satisfies a requested type id.
    ///
    /// The default accepts only the concrete type. Records that stand in
    /// for an abstract family (TLV-style polymorphic dispatch) override
    /// this to also accept the family's id.
    fn represents(&self, id: TypeId) -> bool {
        id == self.as_any().type_id()
    }

    fn clone_box(&self) -> Box<dyn Fields>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Chunk body wrapping a field record plus its cached serialization.
///
/// The cache is filled by the serializer layer on first (de)serialization
/// and cleared whenever the record is mutated, so an immutable record
/// serializes bitwise-identically forever.
pub struct FieldsChunk {
    fields: Box<dyn Fields>,
    serialized: RefCell<Option<Bytes>>,
}

impl FieldsChunk {
    pub fn new(fields: impl Fields) -> Self {
        Self::from_box(Box::new(fields))
    }

    pub(crate) fn from_box(fields: Box<dyn Fields>) -> Self {
        Self {
            fields,
            serialized: RefCell::new(None),
        }
    }

    pub fn fields(&self) -> &dyn Fields {
        self.fields.as_ref()
    }

    pub fn length(&self) -> Bits {
        self.fields.chunk_length()
    }

    /// Downcast to a concrete record type.
    pub fn get<T: Fields>(&self) -> Option<&T> {
        self.fields.as_any().downcast_ref()
    }

    /// Mutable downcast. Invalidates the serialization cache.
    pub(crate) fn get_mut<T: Fields>(&mut self) -> Option<&mut T> {
        self.serialized.replace(None);
        self.fields.as_any_mut().downcast_mut()
    }

    /// Cached serialized representation, if present.
    pub fn serialized(&self) -> Option<Bytes> {
        self.serialized.borrow().clone()
    }

    /// Store the serialized representation. Called by the serializer layer.
    pub fn set_serialized(&self, bytes: Bytes) {
        self.serialized.replace(Some(bytes));
    }
}

impl Clone for FieldsChunk {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone_box(),
            serialized: RefCell::new(self.serialized.borrow().clone()),
        }
    }
}

impl fmt::Debug for FieldsChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldsChunk")
            .field("fields", &self.fields)
            .field("cached", &self.serialized.borrow().is_some())
            .finish()
    }
}
