//! Error types.
//!
//! This module defines the single [`enum@Error`] used across the crate:
//!
//! - contract violations (mutating an immutable chunk, pushing while a pop
//!   iterator has advanced, out-of-range windows)
//! - unsupported operations (deserializing slice/sequence chunks,
//!   serializing a record whose invariants do not hold)
//! - byte stream misuse
//!
//! Peeks that merely cannot deliver the requested representation are *not*
//! errors: they return `None` or a chunk with status flags set, and the
//! caller inspects those.

use thiserror::Error;

use crate::length::Bits;

/// Main error type for chunk and packet operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Mutation was attempted on a chunk already marked immutable.
    #[error("{kind} chunk is immutable and cannot be modified")]
    ImmutableChunk { kind: &'static str },

    /// An operation required an immutable chunk but received a mutable one.
    #[error("{operation} requires an immutable chunk")]
    MutableChunk { operation: &'static str },

    /// A push or trim was attempted while the corresponding pop iterator
    /// had already advanced.
    #[error("{operation} requires the {end} pop offset at zero")]
    IteratorNotAtStart {
        operation: &'static str,
        end: &'static str,
    },

    /// An offset or window does not fit the chunk it addresses.
    #[error("offset {offset} out of range for chunk of length {length}")]
    OffsetOutOfRange { offset: Bits, length: Bits },

    /// Byte streams operate on whole octets.
    #[error("length {length} is not byte-aligned")]
    NonByteAlignedLength { length: Bits },

    /// A serialization or typed conversion needed a serializer that was
    /// never registered.
    #[error("no serializer registered for {type_name}")]
    NoSerializerRegistered { type_name: &'static str },

    /// A record cannot be serialized because its invariants do not hold.
    #[error("cannot serialize {type_name}: {reason}")]
    UnserializableChunk {
        type_name: &'static str,
        reason: &'static str,
    },

    /// A value read from a stream did not match the expected constant.
    #[error("expected byte {expected:#04x}, found {found:#04x} at position {position}")]
    StreamFormatViolation {
        expected: u8,
        found: u8,
        position: usize,
    },

    /// A chunk accessor was used on the wrong variant or record type.
    #[error("expected a {expected} chunk, found {found}")]
    UnexpectedChunkKind {
        expected: &'static str,
        found: &'static str,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
