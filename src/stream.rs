//! Byte streams used by chunk serializers.
//!
//! [`ByteOutputStream`] is append-only; [`ByteInputStream`] is a cursor
//! over immutable data. Integers use network byte order. Reads past the
//! end of an input stream do not fail: they yield zero bytes and set a
//! sticky flag ([`ByteInputStream::is_read_beyond_end`]) that the typed
//! conversion engine inspects to reject underruns.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::ops::Range;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Append-only output stream backed by a growable byte buffer.
#[derive(Debug, Default)]
pub struct ByteOutputStream {
    buf: BytesMut,
}

impl ByteOutputStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty stream with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Current write position. The stream is append-only, so this equals
    /// the number of bytes written so far.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Total bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append a single byte.
    pub fn write_byte(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Append a byte slice.
    pub fn write_bytes(&mut self, src: &[u8]) {
        self.buf.put_slice(src);
    }

    /// Append `count` copies of `value`.
    pub fn write_byte_repeatedly(&mut self, value: u8, count: usize) {
        self.buf.put_bytes(value, count);
    }

    /// Append an unsigned 16-bit integer in network byte order.
    pub fn write_u16(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    /// Append an unsigned 32-bit integer in network byte order.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    /// Append an IPv4 address (4 octets).
    pub fn write_ipv4_address(&mut self, address: Ipv4Addr) {
        self.buf.put_slice(&address.octets());
    }

    /// Append an IPv6 address (16 octets).
    pub fn write_ipv6_address(&mut self, address: Ipv6Addr) {
        self.buf.put_slice(&address.octets());
    }

    /// Copy a window of the written bytes.
    pub fn copy_bytes(&self, range: Range<usize>) -> Bytes {
        Bytes::copy_from_slice(&self.buf[range])
    }

    /// All bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the stream, yielding its contents.
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Cursor over immutable input data.
#[derive(Debug)]
pub struct ByteInputStream {
    data: Bytes,
    position: usize,
    read_beyond_end: bool,
}

impl ByteInputStream {
    /// Create a stream over the given data.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            position: 0,
            read_beyond_end: false,
        }
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left between the position and the end of the data.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move the read position. Clamped to the end of the data.
    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.data.len());
    }

    /// Whether any read has run past the end of the data.
    pub fn is_read_beyond_end(&self) -> bool {
        self.read_beyond_end
    }

    /// Cheap copy of a window of the underlying data.
    pub fn copy_bytes(&self, range: Range<usize>) -> Bytes {
        self.data.slice(range)
    }

    /// Read one byte. Past the end this yields `0` and sets the sticky
    /// beyond-end flag.
    pub fn read_byte(&mut self) -> u8 {
        match self.data.get(self.position) {
            Some(&value) => {
                self.position += 1;
                value
            }
            None => {
                self.read_beyond_end = true;
                0
            }
        }
    }

    /// Read `count` bytes. Missing bytes are zero-filled and set the
    /// beyond-end flag.
    pub fn read_bytes(&mut self, count: usize) -> Bytes {
        let available = self.remaining().min(count);
        let mut out = BytesMut::with_capacity(count);
        out.put_slice(&self.data[self.position..self.position + available]);
        self.position += available;
        if available < count {
            self.read_beyond_end = true;
            out.put_bytes(0, count - available);
        }
        out.freeze()
    }

    /// Read `count` bytes, checking that each equals `value`.
    pub fn read_byte_repeatedly(&mut self, value: u8, count: usize) -> Result<()> {
        for _ in 0..count {
            let position = self.position;
            let found = self.read_byte();
            if found != value {
                return Err(Error::StreamFormatViolation {
                    expected: value,
                    found,
                    position,
                });
            }
        }
        Ok(())
    }

    /// Read an unsigned 16-bit integer in network byte order.
    pub fn read_u16(&mut self) -> u16 {
        u16::from_be_bytes([self.read_byte(), self.read_byte()])
    }

    /// Read an unsigned 32-bit integer in network byte order.
    pub fn read_u32(&mut self) -> u32 {
        u32::from_be_bytes([
            self.read_byte(),
            self.read_byte(),
            self.read_byte(),
            self.read_byte(),
        ])
    }

    /// Read an IPv4 address (4 octets).
    pub fn read_ipv4_address(&mut self) -> Ipv4Addr {
        let mut octets = [0u8; 4];
        for octet in &mut octets {
            *octet = self.read_byte();
        }
        Ipv4Addr::from(octets)
    }

    /// Read an IPv6 address (16 octets).
    pub fn read_ipv6_address(&mut self) -> Ipv6Addr {
        let mut octets = [0u8; 16];
        for octet in &mut octets {
            *octet = self.read_byte();
        }
        Ipv6Addr::from(octets)
    }
}
