//! # netchunk
//!
//! Typed packet representation for network simulation and protocol
//! implementation.
//!
//! Packets, datagrams and frames are modelled as composable, sliceable,
//! typed sequences of *chunks*: structured header records, raw byte
//! arrays, length-only placeholders, referenced windows and flat
//! sequences. Protocol layers push and pop headers and trailers, peek at
//! arbitrary regions in either a typed or a raw-bytes view, share
//! substructure across duplicated packets without copying, and convert
//! transparently between field-level representations and wire bytes.
//!
//! ## Quick start
//!
//! ```rust
//! use netchunk::{bytes, ChunkHandle, Packet};
//!
//! // Build contents: a 10-byte placeholder followed by real octets.
//! let mut packet = Packet::new();
//! let header = ChunkHandle::from_length(bytes(10));
//! header.make_immutable();
//! packet.push_header(&header).unwrap();
//! let payload = ChunkHandle::from_bytes(vec![1, 2, 3, 4]);
//! payload.make_immutable();
//! packet.append(&payload).unwrap();
//!
//! // Downstream, pop the header and look at the data region.
//! let popped = packet.pop_header(None).unwrap().unwrap();
//! assert_eq!(popped.length(), bytes(10));
//! let data = packet.peek_data(None).unwrap().unwrap();
//! assert_eq!(data.as_bytes_chunk().unwrap().bytes(), &[1, 2, 3, 4]);
//! ```
//!
//! Typed views deserialize on demand: define a record implementing
//! [`Fields`] and [`ChunkType`], register a [`FieldsSerializer`] at
//! startup, and `peek_header_as::<MyHeader>(..)` will slice, merge or
//! decode whatever representation the packet happens to hold.
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------------+
//! |                            netchunk                               |
//! +-------------------------------------------------------------------+
//! |  chunk/      - Chunk variants, status flags, peek algebra         |
//! |  serializer/ - serializer registry, caching, telemetry            |
//! |  stream      - byte input/output streams (network byte order)     |
//! |  packet      - Packet with header/trailer pop iterators           |
//! |  queue       - ChunkQueue stream-like FIFO                        |
//! |  buffer/     - ChunkBuffer, ReassemblyBuffer, ReorderBuffer       |
//! |  length      - bit-granular lengths with a byte convenience layer |
//! |  error       - error types                                        |
//! +-------------------------------------------------------------------+
//! ```
//!
//! ## Model
//!
//! - **Immutability is one-way.** A chunk starts mutable, is frozen with
//!   `make_immutable`, and is then safely shared by cheap handles.
//!   Mutators copy-on-write when a mutable chunk is shared.
//! - **Peeks never lie.** A window clipped by a chunk boundary comes back
//!   flagged incomplete; undecodable typed peeks return `None`; corrupted
//!   data keeps its incorrect flag through every transformation.
//! - **Single-threaded.** Sharing uses `Rc`; the serializer registry and
//!   telemetry counters are thread-local. There is no locking and no
//!   async surface.

pub mod buffer;
pub mod chunk;
pub mod error;
pub mod length;
pub mod packet;
pub mod queue;
pub mod serializer;
pub mod stream;

pub use buffer::{ChunkBuffer, ReassemblyBuffer, ReorderBuffer};
pub use chunk::{
    BytesChunk, Chunk, ChunkBody, ChunkHandle, ChunkIterator, ChunkTarget, ChunkType, Fields,
    FieldsChunk, LengthChunk, SequenceChunk, SliceChunk,
};
pub use error::{Error, Result};
pub use length::{bits, bytes, Bits};
pub use packet::Packet;
pub use queue::ChunkQueue;
pub use serializer::{
    deserialize, deserialize_as, register_serializer, serialize, serialize_window,
    total_deserialized_bits, total_serialized_bits, ChunkSerializer, FieldsChunkSerializer,
    FieldsSerializer,
};
pub use stream::{ByteInputStream, ByteOutputStream};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
