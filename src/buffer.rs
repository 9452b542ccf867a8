//! Contiguous byte buffers — the read side and the write side.
//!
//! # Reading
//! [`ByteBuffer`] owns one immutable byte region behind shared storage and a
//! cursor.  Every numeric width (8/16/24/32-bit integers in both orders,
//! 32/64-bit IEEE floats, 48-bit reals, 80-bit extended floats), bit-level
//! access, and four string-encoding families are available as `read_*`
//! (cursor-advancing) and `peek_*` (absolute offset, cursor untouched)
//! forms.  A failed read leaves the cursor where it was and reports the
//! requested and available byte counts.
//!
//! # Writing
//! [`ByteBufferBuilder`] is the write side: a growable staging region with
//! its own cursor.  Writes never fail — writing past the current end
//! zero-fills the gap — and `commit()` finalizes the staged bytes into an
//! immutable [`ByteBuffer`].
//!
//! # Sharing
//! Once a buffer is in read mode its storage is immutable, so `clone()`,
//! `copy()`, and full-range `slice()` share the same bytes; only the cursors
//! are independent.

use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::trace;

use crate::encoding::{decode_string, encode_string, StringEncoding};
use crate::error::{Error, Result};
use crate::float::{float48, float80};

// ── Read side ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ByteBuffer {
    data: Arc<[u8]>,
    offset: usize,
}

impl ByteBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: data.into(),
            offset: 0,
        }
    }

    /// A zero-filled buffer of the given size.
    pub fn allocate(size: usize) -> Self {
        Self::new(vec![0; size])
    }

    pub fn builder() -> ByteBufferBuilder {
        ByteBufferBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn remaining_bytes(&self) -> usize {
        self.len() - self.offset
    }

    /// True if `bytes` more bytes can be read from the cursor.
    pub fn available(&self, bytes: usize) -> bool {
        bytes <= self.remaining_bytes()
    }

    /// True if `bytes` bytes can be read starting at `offset`.
    pub fn available_at(&self, bytes: usize, offset: usize) -> bool {
        bytes <= self.len().saturating_sub(offset)
    }

    fn require(&self, bytes: usize) -> Result<()> {
        if self.available(bytes) {
            Ok(())
        } else {
            Err(Error::underflow(bytes, self.remaining_bytes()))
        }
    }

    fn require_at(&self, bytes: usize, offset: usize) -> Result<()> {
        if self.available_at(bytes, offset) {
            Ok(())
        } else {
            Err(Error::underflow(bytes, self.len().saturating_sub(offset)))
        }
    }

    // ── Cursor movement ─────────────────────────────────────────────────────

    pub fn advance(&mut self, bytes: usize) -> Result<()> {
        self.require(bytes)?;
        self.offset += bytes;
        trace!("advance: offset {}", self.offset);
        Ok(())
    }

    pub fn rewind(&mut self, bytes: usize) -> Result<()> {
        if bytes > self.offset {
            return Err(Error::underflow(bytes, self.offset));
        }
        self.offset -= bytes;
        trace!("rewind: offset {}", self.offset);
        Ok(())
    }

    /// Go to an absolute offset, expressed via advance/rewind.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.offset {
            self.advance(position - self.offset)
        } else if position < self.offset {
            self.rewind(self.offset - position)
        } else {
            Ok(())
        }
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }

    // ── Raw access ──────────────────────────────────────────────────────────

    fn read_slice(&mut self, bytes: usize) -> Result<&[u8]> {
        self.require(bytes)?;
        let start = self.offset;
        self.offset += bytes;
        Ok(&self.data[start..start + bytes])
    }

    fn peek_slice(&self, bytes: usize, offset: usize) -> Result<&[u8]> {
        self.require_at(bytes, offset)?;
        Ok(&self.data[offset..offset + bytes])
    }

    // ── Integer reads ───────────────────────────────────────────────────────

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_slice(1)?[0])
    }

    pub fn peek_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.peek_slice(1, offset)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn peek_i8(&self, offset: usize) -> Result<i8> {
        Ok(self.peek_u8(offset)? as i8)
    }

    pub fn read_u16(&mut self, little_endian: bool) -> Result<u16> {
        let raw = self.read_slice(2)?;
        Ok(order_read_u16(raw, little_endian))
    }

    pub fn peek_u16(&self, offset: usize, little_endian: bool) -> Result<u16> {
        let raw = self.peek_slice(2, offset)?;
        Ok(order_read_u16(raw, little_endian))
    }

    pub fn read_i16(&mut self, little_endian: bool) -> Result<i16> {
        Ok(self.read_u16(little_endian)? as i16)
    }

    pub fn peek_i16(&self, offset: usize, little_endian: bool) -> Result<i16> {
        Ok(self.peek_u16(offset, little_endian)? as i16)
    }

    pub fn read_u24(&mut self, little_endian: bool) -> Result<u32> {
        let raw = self.read_slice(3)?;
        Ok(order_read_uint(raw, 3, little_endian) as u32)
    }

    pub fn peek_u24(&self, offset: usize, little_endian: bool) -> Result<u32> {
        let raw = self.peek_slice(3, offset)?;
        Ok(order_read_uint(raw, 3, little_endian) as u32)
    }

    pub fn read_i24(&mut self, little_endian: bool) -> Result<i32> {
        let raw = self.read_slice(3)?;
        Ok(order_read_int(raw, 3, little_endian) as i32)
    }

    pub fn peek_i24(&self, offset: usize, little_endian: bool) -> Result<i32> {
        let raw = self.peek_slice(3, offset)?;
        Ok(order_read_int(raw, 3, little_endian) as i32)
    }

    pub fn read_u32(&mut self, little_endian: bool) -> Result<u32> {
        let raw = self.read_slice(4)?;
        Ok(order_read_u32(raw, little_endian))
    }

    pub fn peek_u32(&self, offset: usize, little_endian: bool) -> Result<u32> {
        let raw = self.peek_slice(4, offset)?;
        Ok(order_read_u32(raw, little_endian))
    }

    pub fn read_i32(&mut self, little_endian: bool) -> Result<i32> {
        Ok(self.read_u32(little_endian)? as i32)
    }

    pub fn peek_i32(&self, offset: usize, little_endian: bool) -> Result<i32> {
        Ok(self.peek_u32(offset, little_endian)? as i32)
    }

    // ── Float reads ─────────────────────────────────────────────────────────

    pub fn read_f32(&mut self, little_endian: bool) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32(little_endian)?))
    }

    pub fn peek_f32(&self, offset: usize, little_endian: bool) -> Result<f32> {
        Ok(f32::from_bits(self.peek_u32(offset, little_endian)?))
    }

    pub fn read_f64(&mut self, little_endian: bool) -> Result<f64> {
        let raw = self.read_slice(8)?;
        Ok(order_read_f64(raw, little_endian))
    }

    pub fn peek_f64(&self, offset: usize, little_endian: bool) -> Result<f64> {
        let raw = self.peek_slice(8, offset)?;
        Ok(order_read_f64(raw, little_endian))
    }

    /// Read a 48-bit real.  `little_endian` selects which layout the file
    /// stores; see [`crate::float`] for the bit structure.
    pub fn read_f48(&mut self, little_endian: bool) -> Result<f64> {
        let raw = self.read_slice(6)?;
        let mut bytes = [0u8; 6];
        bytes.copy_from_slice(raw);
        if !little_endian {
            bytes.reverse();
        }
        Ok(float48(bytes))
    }

    pub fn peek_f48(&self, offset: usize, little_endian: bool) -> Result<f64> {
        let raw = self.peek_slice(6, offset)?;
        let mut bytes = [0u8; 6];
        bytes.copy_from_slice(raw);
        if !little_endian {
            bytes.reverse();
        }
        Ok(float48(bytes))
    }

    /// Read an 80-bit extended-precision float.
    pub fn read_f80(&mut self, little_endian: bool) -> Result<f64> {
        let raw = self.read_slice(10)?;
        let mut bytes = [0u8; 10];
        bytes.copy_from_slice(raw);
        if !little_endian {
            bytes.reverse();
        }
        Ok(float80(bytes))
    }

    pub fn peek_f80(&self, offset: usize, little_endian: bool) -> Result<f64> {
        let raw = self.peek_slice(10, offset)?;
        let mut bytes = [0u8; 10];
        bytes.copy_from_slice(raw);
        if !little_endian {
            bytes.reverse();
        }
        Ok(float80(bytes))
    }

    // ── Bit access ──────────────────────────────────────────────────────────

    /// Extract `length` bits (1–8) starting at bit `position` (0–7, where 0
    /// is the most significant bit) of the byte at `offset`.
    pub fn peek_bit(&self, position: u32, length: u32, offset: usize) -> Result<u8> {
        if position > 7 {
            return Err(Error::InvalidBitPosition(position));
        }
        if !(1..=8).contains(&length) {
            return Err(Error::InvalidBitLength(length));
        }
        let value = u32::from(self.peek_u8(offset)?);
        Ok((((value << position) & 0xff) >> (8 - length)) as u8)
    }

    // ── Buffers and strings ─────────────────────────────────────────────────

    /// Read the next `length` bytes into a new independent buffer.
    pub fn read_buffer(&mut self, length: usize) -> Result<ByteBuffer> {
        let raw = self.read_slice(length)?;
        Ok(ByteBuffer::from(raw))
    }

    pub fn peek_buffer(&self, offset: usize, length: usize) -> Result<ByteBuffer> {
        let raw = self.peek_slice(length, offset)?;
        Ok(ByteBuffer::from(raw))
    }

    /// Read a string from the cursor.  `length` of `None` selects
    /// null-terminated decoding over the remaining bytes.
    pub fn read_string(&mut self, length: Option<usize>, encoding: StringEncoding) -> Result<String> {
        self.decode_string(self.offset, length, encoding, true)
    }

    pub fn peek_string(
        &self,
        offset: usize,
        length: Option<usize>,
        encoding: StringEncoding,
    ) -> Result<String> {
        let decoded = decode_string(
            |off| self.peek_u8(off),
            offset,
            length,
            self.remaining_bytes(),
            encoding,
        )?;
        Ok(decoded.text)
    }

    /// Decode a string at `offset`, optionally advancing the cursor by the
    /// decoded window afterwards.
    pub fn decode_string(
        &mut self,
        offset: usize,
        length: Option<usize>,
        encoding: StringEncoding,
        advance: bool,
    ) -> Result<String> {
        let decoded = decode_string(
            |off| self.peek_u8(off),
            offset,
            length,
            self.remaining_bytes(),
            encoding,
        )?;
        if advance {
            self.advance(decoded.advance_by)?;
        }
        Ok(decoded.text)
    }

    // ── Comparison and slicing ──────────────────────────────────────────────

    /// Bytewise equality of `input` against this buffer starting at
    /// `offset`.  Empty input never matches.
    pub fn compare(&self, input: &[u8], offset: usize) -> bool {
        let length = input.len();
        if length == 0 {
            return false;
        }
        let local = self.slice(offset, length);
        local.len() == length && local.as_bytes() == input
    }

    /// A view over the same storage with a fresh cursor.
    pub fn copy(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            offset: 0,
        }
    }

    /// A new buffer over `length` bytes starting at `position`, clamped to
    /// the underlying storage.  The full range aliases `copy()`.
    pub fn slice(&self, position: usize, length: usize) -> Self {
        if position == 0 && length >= self.len() {
            return self.copy();
        }
        let start = position.min(self.len());
        let end = position.saturating_add(length).min(self.len());
        Self {
            data: Arc::from(&self.data[start..end]),
            offset: 0,
        }
    }
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        Self::new(data.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for ByteBuffer {
    fn from(data: [u8; N]) -> Self {
        Self::new(data.to_vec())
    }
}

impl From<&str> for ByteBuffer {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }
}

pub(crate) fn order_read_u16(raw: &[u8], little_endian: bool) -> u16 {
    if little_endian {
        LittleEndian::read_u16(raw)
    } else {
        BigEndian::read_u16(raw)
    }
}

pub(crate) fn order_read_u32(raw: &[u8], little_endian: bool) -> u32 {
    if little_endian {
        LittleEndian::read_u32(raw)
    } else {
        BigEndian::read_u32(raw)
    }
}

pub(crate) fn order_read_f64(raw: &[u8], little_endian: bool) -> f64 {
    if little_endian {
        LittleEndian::read_f64(raw)
    } else {
        BigEndian::read_f64(raw)
    }
}

pub(crate) fn order_read_uint(raw: &[u8], nbytes: usize, little_endian: bool) -> u64 {
    if little_endian {
        LittleEndian::read_uint(raw, nbytes)
    } else {
        BigEndian::read_uint(raw, nbytes)
    }
}

pub(crate) fn order_read_int(raw: &[u8], nbytes: usize, little_endian: bool) -> i64 {
    if little_endian {
        LittleEndian::read_int(raw, nbytes)
    } else {
        BigEndian::read_int(raw, nbytes)
    }
}

// ── Write side ───────────────────────────────────────────────────────────────

/// Staging area for constructing a [`ByteBuffer`].
///
/// Writes go through a cursor and can never fail: writing past the current
/// end grows the staging region, zero-filling any gap.  `seek` repositions
/// the cursor for patch-in-place writes (chunk sizes, header fields).
#[derive(Debug, Clone, Default)]
pub struct ByteBufferBuilder {
    staging: Vec<u8>,
    offset: usize,
}

impl ByteBufferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.staging.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staging.is_empty()
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    /// Move the write cursor.  Positions past the end are legal; the gap is
    /// zero-filled by the next write.
    pub fn seek(&mut self, position: usize) {
        self.offset = position;
    }

    fn put(&mut self, offset: usize, bytes: &[u8]) {
        let end = offset + bytes.len();
        if end > self.staging.len() {
            self.staging.resize(end, 0);
        }
        self.staging[offset..end].copy_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.put(self.offset, &[value]);
        self.offset += 1;
    }

    pub fn write_u16(&mut self, value: u16, little_endian: bool) {
        let bytes = if little_endian {
            value.to_le_bytes()
        } else {
            value.to_be_bytes()
        };
        self.put(self.offset, &bytes);
        self.offset += 2;
    }

    /// Write the low 24 bits of `value`.
    pub fn write_u24(&mut self, value: u32, little_endian: bool) {
        let mut bytes = [0u8; 3];
        let value = u64::from(value & 0x00ff_ffff);
        if little_endian {
            LittleEndian::write_uint(&mut bytes, value, 3);
        } else {
            BigEndian::write_uint(&mut bytes, value, 3);
        }
        self.put(self.offset, &bytes);
        self.offset += 3;
    }

    pub fn write_u32(&mut self, value: u32, little_endian: bool) {
        let bytes = if little_endian {
            value.to_le_bytes()
        } else {
            value.to_be_bytes()
        };
        self.put(self.offset, &bytes);
        self.offset += 4;
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.put(self.offset, data);
        self.offset += data.len();
    }

    pub fn write_string(&mut self, text: &str, encoding: StringEncoding) {
        let data = encode_string(text, encoding);
        self.write_bytes(&data);
    }

    /// Finalize the staged bytes into an immutable read-mode buffer.
    pub fn commit(self) -> ByteBuffer {
        trace!("commit: {} bytes staged", self.staging.len());
        ByteBuffer::new(self.staging)
    }
}
