//! Registry of field-record serializers.
//!
//! The registry is process-wide state in the crate's single-threaded
//! model: install serializers at startup, treat it as read-only
//! afterwards. Lookup is by the requested type id, so an abstract family
//! marker and each concrete record type get their own entries.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::chunk::{Chunk, ChunkHandle, ChunkTarget, ChunkType};
use crate::error::Result;
use crate::length::Bits;
use crate::stream::{ByteInputStream, ByteOutputStream};

/// Encoder/decoder between a typed chunk and its byte representation.
///
/// `offset`/`length` select a window of the serialized form; a `None`
/// length means to the end of the chunk.
pub trait ChunkSerializer: 'static {
    fn serialize(
        &self,
        stream: &mut ByteOutputStream,
        chunk: &Chunk,
        offset: Bits,
        length: Option<Bits>,
    ) -> Result<()>;

    fn deserialize(&self, stream: &mut ByteInputStream) -> Result<ChunkHandle>;
}

thread_local! {
    static REGISTRY: RefCell<HashMap<TypeId, Rc<dyn ChunkSerializer>>> =
        RefCell::new(HashMap::new());
}

/// Register the serializer for a field record type or abstract family
/// marker. Call at process start; a later registration for the same type
/// replaces the earlier one.
///
/// # Panics
///
/// Panics when `T` targets a built-in representation: length and bytes
/// chunks serialize structurally and take no registered serializer.
pub fn register_serializer<T: ChunkType>(serializer: impl ChunkSerializer) {
    let ChunkTarget::Fields { id, name } = T::target() else {
        panic!("only field record types take registered serializers");
    };
    debug!(type_name = name, "registering chunk serializer");
    REGISTRY.with(|registry| registry.borrow_mut().insert(id, Rc::new(serializer)));
}

pub(crate) fn serializer_for(id: TypeId) -> Option<Rc<dyn ChunkSerializer>> {
    REGISTRY.with(|registry| registry.borrow().get(&id).cloned())
}
