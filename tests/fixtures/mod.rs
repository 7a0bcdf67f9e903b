//! Test schema types shared by the integration tests.
//!
//! These records model the shapes protocol code actually defines: a
//! fixed-size application header, a variable-length transport header with
//! a graceful partial parser, a network header that validates its
//! protocol field on decode, TLV headers with an abstract family marker
//! for polymorphic dispatch, and a compound header whose decoder recurses
//! through the registry.

#![allow(dead_code)]

use std::any::{Any, TypeId};

use netchunk::{
    bytes, deserialize_as, register_serializer, serialize, Bits, ByteInputStream,
    ByteOutputStream, ChunkHandle, ChunkTarget, ChunkType, Error, Fields, FieldsChunkSerializer,
    FieldsSerializer, Result,
};

macro_rules! fields_boilerplate {
    ($ty:ty) => {
        fn type_name(&self) -> &'static str {
            stringify!($ty)
        }

        fn clone_box(&self) -> Box<dyn Fields> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    };
}

/// Register every fixture serializer. Idempotent; call at the top of each
/// test that exercises typed conversion.
pub fn register_all() {
    register_serializer::<ApplicationHeader>(FieldsChunkSerializer(ApplicationHeaderSerializer));
    register_serializer::<TcpHeader>(FieldsChunkSerializer(TcpHeaderSerializer));
    register_serializer::<IpHeader>(FieldsChunkSerializer(IpHeaderSerializer));
    register_serializer::<CompoundHeader>(FieldsChunkSerializer(CompoundHeaderSerializer));
    register_serializer::<TlvHeader>(FieldsChunkSerializer(TlvHeaderSerializer));
    register_serializer::<TlvHeaderBool>(FieldsChunkSerializer(TlvHeaderBoolSerializer));
    register_serializer::<TlvHeaderInt>(FieldsChunkSerializer(TlvHeaderIntSerializer));
    register_serializer::<EthernetHeader>(FieldsChunkSerializer(EthernetHeaderSerializer));
    register_serializer::<EthernetTrailer>(FieldsChunkSerializer(EthernetTrailerSerializer));
}

pub fn make_vector(length: usize) -> Vec<u8> {
    (0..length).map(|i| i as u8).collect()
}

pub fn immutable_length_chunk(length: Bits) -> ChunkHandle {
    let chunk = ChunkHandle::from_length(length);
    chunk.make_immutable();
    chunk
}

pub fn immutable_bytes_chunk(data: Vec<u8>) -> ChunkHandle {
    let chunk = ChunkHandle::from_bytes(data);
    chunk.make_immutable();
    chunk
}

pub fn immutable_application_header(some_data: u16) -> ChunkHandle {
    let chunk = ChunkHandle::from_fields(ApplicationHeader { some_data });
    chunk.make_immutable();
    chunk
}

// === ApplicationHeader: fixed 10-byte record ===

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationHeader {
    pub some_data: u16,
}

impl ApplicationHeader {
    pub const LENGTH: Bits = bytes(10);
}

impl Fields for ApplicationHeader {
    fn chunk_length(&self) -> Bits {
        Self::LENGTH
    }

    fields_boilerplate!(ApplicationHeader);
}

impl ChunkType for ApplicationHeader {
    fn target() -> ChunkTarget {
        ChunkTarget::of::<ApplicationHeader>()
    }
}

pub struct ApplicationHeaderSerializer;

impl FieldsSerializer for ApplicationHeaderSerializer {
    fn serialize_fields(&self, stream: &mut ByteOutputStream, fields: &dyn Fields) -> Result<()> {
        let header = fields.as_any().downcast_ref::<ApplicationHeader>().unwrap();
        stream.write_u16(header.some_data);
        stream.write_byte_repeatedly(0, 8);
        Ok(())
    }

    fn deserialize_fields(&self, stream: &mut ByteInputStream) -> Result<ChunkHandle> {
        let some_data = stream.read_u16();
        stream.read_byte_repeatedly(0, 8)?;
        Ok(ChunkHandle::from_fields(ApplicationHeader { some_data }))
    }
}

// === TcpHeader: variable length, graceful partial parse ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcMode {
    Declared,
    Computed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpHeader {
    pub chunk_length: Bits,
    pub length_field: u16,
    pub src_port: u16,
    pub dest_port: u16,
    pub crc_mode: CrcMode,
    pub crc: u16,
}

impl Default for TcpHeader {
    fn default() -> Self {
        Self {
            chunk_length: bytes(16),
            length_field: 16,
            src_port: 0,
            dest_port: 0,
            crc_mode: CrcMode::Declared,
            crc: 0,
        }
    }
}

impl Fields for TcpHeader {
    fn chunk_length(&self) -> Bits {
        self.chunk_length
    }

    fields_boilerplate!(TcpHeader);
}

impl ChunkType for TcpHeader {
    fn target() -> ChunkTarget {
        ChunkTarget::of::<TcpHeader>()
    }
}

pub struct TcpHeaderSerializer;

impl FieldsSerializer for TcpHeaderSerializer {
    fn serialize_fields(&self, stream: &mut ByteOutputStream, fields: &dyn Fields) -> Result<()> {
        let header = fields.as_any().downcast_ref::<TcpHeader>().unwrap();
        if header.crc_mode != CrcMode::Computed {
            return Err(Error::UnserializableChunk {
                type_name: "TcpHeader",
                reason: "crc mode must be computed",
            });
        }
        stream.write_u16(header.length_field);
        stream.write_u16(header.src_port);
        stream.write_u16(header.dest_port);
        stream.write_u16(header.crc);
        stream.write_byte_repeatedly(0, header.length_field as usize - 8);
        Ok(())
    }

    fn deserialize_fields(&self, stream: &mut ByteInputStream) -> Result<ChunkHandle> {
        let start = stream.position();
        let remaining = stream.remaining();
        let mut header = TcpHeader::default();
        header.length_field = stream.read_u16();
        let truncated = header.length_field as usize > remaining;
        let length = (header.length_field as usize).min(remaining);
        header.chunk_length = bytes(length as u64);
        if stream.position() - start + 2 <= length {
            header.src_port = stream.read_u16();
        }
        if stream.position() - start + 2 <= length {
            header.dest_port = stream.read_u16();
        }
        if stream.position() - start + 2 <= length {
            header.crc = stream.read_u16();
            header.crc_mode = CrcMode::Computed;
        }
        stream.seek(start + length);
        let chunk = ChunkHandle::from_fields(header);
        if truncated {
            chunk.mark_incomplete();
        }
        Ok(chunk)
    }
}

// === IpHeader: protocol field validated on decode ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    Unknown,
    Tcp,
    Udp,
}

impl IpProtocol {
    fn code(self) -> u16 {
        match self {
            IpProtocol::Unknown => 0xFFFF,
            IpProtocol::Tcp => 6,
            IpProtocol::Udp => 17,
        }
    }

    fn from_code(code: u16) -> Self {
        match code {
            6 => IpProtocol::Tcp,
            17 => IpProtocol::Udp,
            _ => IpProtocol::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpHeader {
    pub protocol: IpProtocol,
}

impl IpHeader {
    pub const LENGTH: Bits = bytes(20);
}

impl Default for IpHeader {
    fn default() -> Self {
        Self {
            protocol: IpProtocol::Tcp,
        }
    }
}

impl Fields for IpHeader {
    fn chunk_length(&self) -> Bits {
        Self::LENGTH
    }

    fields_boilerplate!(IpHeader);
}

impl ChunkType for IpHeader {
    fn target() -> ChunkTarget {
        ChunkTarget::of::<IpHeader>()
    }
}

pub struct IpHeaderSerializer;

impl FieldsSerializer for IpHeaderSerializer {
    fn serialize_fields(&self, stream: &mut ByteOutputStream, fields: &dyn Fields) -> Result<()> {
        let header = fields.as_any().downcast_ref::<IpHeader>().unwrap();
        stream.write_u16(header.protocol.code());
        stream.write_byte_repeatedly(0, 18);
        Ok(())
    }

    fn deserialize_fields(&self, stream: &mut ByteInputStream) -> Result<ChunkHandle> {
        let code = stream.read_u16();
        let protocol = IpProtocol::from_code(code);
        stream.read_byte_repeatedly(0, 18)?;
        let chunk = ChunkHandle::from_fields(IpHeader { protocol });
        if protocol == IpProtocol::Unknown {
            chunk.mark_improperly_represented();
        }
        Ok(chunk)
    }
}

// === CompoundHeader: decoder recurses through the registry ===

#[derive(Debug, Clone, Default)]
pub struct CompoundHeader {
    pub chunks: Vec<ChunkHandle>,
}

impl Fields for CompoundHeader {
    fn chunk_length(&self) -> Bits {
        self.chunks.iter().map(|c| c.length()).sum()
    }

    fields_boilerplate!(CompoundHeader);
}

impl ChunkType for CompoundHeader {
    fn target() -> ChunkTarget {
        ChunkTarget::of::<CompoundHeader>()
    }
}

pub struct CompoundHeaderSerializer;

impl FieldsSerializer for CompoundHeaderSerializer {
    fn serialize_fields(&self, stream: &mut ByteOutputStream, fields: &dyn Fields) -> Result<()> {
        let header = fields.as_any().downcast_ref::<CompoundHeader>().unwrap();
        for chunk in &header.chunks {
            serialize(stream, chunk)?;
        }
        Ok(())
    }

    fn deserialize_fields(&self, stream: &mut ByteInputStream) -> Result<ChunkHandle> {
        let ip_header = deserialize_as::<IpHeader>(stream)?;
        Ok(ChunkHandle::from_fields(CompoundHeader {
            chunks: vec![ip_header],
        }))
    }
}

// === TLV headers: polymorphic dispatch through a family marker ===

/// Abstract family marker: `peek_as::<TlvHeader>` matches any concrete
/// TLV record and dispatches deserialization on the type byte.
pub struct TlvHeader;

impl ChunkType for TlvHeader {
    fn target() -> ChunkTarget {
        ChunkTarget::of::<TlvHeader>()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvHeaderBool {
    pub bool_value: bool,
}

impl TlvHeaderBool {
    pub const TYPE: u8 = 1;
    pub const LENGTH: Bits = bytes(3);
}

impl Fields for TlvHeaderBool {
    fn chunk_length(&self) -> Bits {
        Self::LENGTH
    }

    fn represents(&self, id: TypeId) -> bool {
        id == TypeId::of::<TlvHeaderBool>() || id == TypeId::of::<TlvHeader>()
    }

    fields_boilerplate!(TlvHeaderBool);
}

impl ChunkType for TlvHeaderBool {
    fn target() -> ChunkTarget {
        ChunkTarget::of::<TlvHeaderBool>()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvHeaderInt {
    pub int16_value: i16,
}

impl TlvHeaderInt {
    pub const TYPE: u8 = 2;
    pub const LENGTH: Bits = bytes(4);
}

impl Fields for TlvHeaderInt {
    fn chunk_length(&self) -> Bits {
        Self::LENGTH
    }

    fn represents(&self, id: TypeId) -> bool {
        id == TypeId::of::<TlvHeaderInt>() || id == TypeId::of::<TlvHeader>()
    }

    fields_boilerplate!(TlvHeaderInt);
}

impl ChunkType for TlvHeaderInt {
    fn target() -> ChunkTarget {
        ChunkTarget::of::<TlvHeaderInt>()
    }
}

pub struct TlvHeaderSerializer;

impl FieldsSerializer for TlvHeaderSerializer {
    fn serialize_fields(&self, _stream: &mut ByteOutputStream, _fields: &dyn Fields) -> Result<()> {
        Err(Error::UnserializableChunk {
            type_name: "TlvHeader",
            reason: "abstract tlv header",
        })
    }

    fn deserialize_fields(&self, stream: &mut ByteInputStream) -> Result<ChunkHandle> {
        let position = stream.position();
        let tlv_type = stream.read_byte();
        stream.seek(position);
        match tlv_type {
            TlvHeaderBool::TYPE => TlvHeaderBoolSerializer.deserialize_fields(stream),
            TlvHeaderInt::TYPE => TlvHeaderIntSerializer.deserialize_fields(stream),
            found => Err(Error::StreamFormatViolation {
                expected: TlvHeaderBool::TYPE,
                found,
                position,
            }),
        }
    }
}

pub struct TlvHeaderBoolSerializer;

impl FieldsSerializer for TlvHeaderBoolSerializer {
    fn serialize_fields(&self, stream: &mut ByteOutputStream, fields: &dyn Fields) -> Result<()> {
        let header = fields.as_any().downcast_ref::<TlvHeaderBool>().unwrap();
        stream.write_byte(TlvHeaderBool::TYPE);
        stream.write_byte(TlvHeaderBool::LENGTH.byte_count()? as u8);
        stream.write_byte(header.bool_value as u8);
        Ok(())
    }

    fn deserialize_fields(&self, stream: &mut ByteInputStream) -> Result<ChunkHandle> {
        stream.read_byte_repeatedly(TlvHeaderBool::TYPE, 1)?;
        stream.read_byte_repeatedly(TlvHeaderBool::LENGTH.byte_count()? as u8, 1)?;
        let bool_value = stream.read_byte() != 0;
        Ok(ChunkHandle::from_fields(TlvHeaderBool { bool_value }))
    }
}

pub struct TlvHeaderIntSerializer;

impl FieldsSerializer for TlvHeaderIntSerializer {
    fn serialize_fields(&self, stream: &mut ByteOutputStream, fields: &dyn Fields) -> Result<()> {
        let header = fields.as_any().downcast_ref::<TlvHeaderInt>().unwrap();
        stream.write_byte(TlvHeaderInt::TYPE);
        stream.write_byte(TlvHeaderInt::LENGTH.byte_count()? as u8);
        stream.write_u16(header.int16_value as u16);
        Ok(())
    }

    fn deserialize_fields(&self, stream: &mut ByteInputStream) -> Result<ChunkHandle> {
        stream.read_byte_repeatedly(TlvHeaderInt::TYPE, 1)?;
        stream.read_byte_repeatedly(TlvHeaderInt::LENGTH.byte_count()? as u8, 1)?;
        let int16_value = stream.read_u16() as i16;
        Ok(ChunkHandle::from_fields(TlvHeaderInt { int16_value }))
    }
}

// === Ethernet framing records used by the encapsulation tests ===

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EthernetHeader;

impl EthernetHeader {
    pub const LENGTH: Bits = bytes(14);
}

impl Fields for EthernetHeader {
    fn chunk_length(&self) -> Bits {
        Self::LENGTH
    }

    fields_boilerplate!(EthernetHeader);
}

impl ChunkType for EthernetHeader {
    fn target() -> ChunkTarget {
        ChunkTarget::of::<EthernetHeader>()
    }
}

pub struct EthernetHeaderSerializer;

impl FieldsSerializer for EthernetHeaderSerializer {
    fn serialize_fields(&self, stream: &mut ByteOutputStream, _fields: &dyn Fields) -> Result<()> {
        stream.write_byte_repeatedly(0, EthernetHeader::LENGTH.byte_count()?);
        Ok(())
    }

    fn deserialize_fields(&self, stream: &mut ByteInputStream) -> Result<ChunkHandle> {
        stream.read_byte_repeatedly(0, EthernetHeader::LENGTH.byte_count()?)?;
        Ok(ChunkHandle::from_fields(EthernetHeader))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EthernetTrailer;

impl EthernetTrailer {
    pub const LENGTH: Bits = bytes(4);
}

impl Fields for EthernetTrailer {
    fn chunk_length(&self) -> Bits {
        Self::LENGTH
    }

    fields_boilerplate!(EthernetTrailer);
}

impl ChunkType for EthernetTrailer {
    fn target() -> ChunkTarget {
        ChunkTarget::of::<EthernetTrailer>()
    }
}

pub struct EthernetTrailerSerializer;

impl FieldsSerializer for EthernetTrailerSerializer {
    fn serialize_fields(&self, stream: &mut ByteOutputStream, _fields: &dyn Fields) -> Result<()> {
        stream.write_byte_repeatedly(0, EthernetTrailer::LENGTH.byte_count()?);
        Ok(())
    }

    fn deserialize_fields(&self, stream: &mut ByteInputStream) -> Result<ChunkHandle> {
        stream.read_byte_repeatedly(0, EthernetTrailer::LENGTH.byte_count()?)?;
        Ok(ChunkHandle::from_fields(EthernetTrailer))
    }
}
