//! A stream façade over a [`BufferChain`].
//!
//! [`ByteStream`] exposes the same read/peek surface as [`ByteBuffer`] but
//! crosses buffer boundaries transparently: multi-byte values are assembled
//! one byte at a time into a small reusable scratch region and reinterpreted
//! as the target width, so a `u32` split 3/1 across two buffers reads the
//! same as from one contiguous buffer.
//!
//! Two cursors are tracked: `local_offset` (position within the chain's
//! current buffer) and `offset` (position since the start of the stream).
//! Peek offsets are relative to the start of the chain's current buffer.
//!
//! The stream never appends to the chain itself; callers push new buffers
//! onto `chain` as data arrives.  `copy()` snapshots the chain cursor and
//! both offsets for speculative parses that may need to roll back.

use log::{debug, trace};

use crate::buffer::{
    order_read_f64, order_read_int, order_read_u16, order_read_u32, order_read_uint, ByteBuffer,
};
use crate::chain::BufferChain;
use crate::encoding::{decode_string, StringEncoding};
use crate::error::{Error, Result};
use crate::float::{float48, float80};

/// Default scratch region size.  Sizes are rounded up to a multiple of 8;
/// anything smaller than the default is raised to it so that every
/// supported numeric width fits.
pub const DEFAULT_SCRATCH_SIZE: usize = 16;

#[derive(Debug, Clone)]
pub struct ByteStream {
    pub chain: BufferChain,
    scratch: Vec<u8>,
    local_offset: usize,
    offset: usize,
}

impl ByteStream {
    pub fn new(chain: BufferChain) -> Self {
        Self::with_scratch_size(chain, DEFAULT_SCRATCH_SIZE)
    }

    pub fn with_scratch_size(chain: BufferChain, size: usize) -> Self {
        let mut size = if size == 0 { DEFAULT_SCRATCH_SIZE } else { size };
        if size % 8 != 0 {
            size += 8 - size % 8;
        }
        let size = size.max(DEFAULT_SCRATCH_SIZE);
        Self {
            chain,
            scratch: vec![0; size],
            local_offset: 0,
            offset: 0,
        }
    }

    /// A stream over a single buffer, scratch sized to it.
    pub fn from_buffer(buffer: ByteBuffer) -> Self {
        let size = buffer.len();
        let mut chain = BufferChain::new();
        chain.append(buffer);
        Self::with_scratch_size(chain, size)
    }

    pub fn from_bytes(data: impl Into<ByteBuffer>) -> Self {
        Self::from_buffer(data.into())
    }

    /// Position since the start of the stream.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Position within the chain's current buffer.
    pub fn local_offset(&self) -> usize {
        self.local_offset
    }

    pub fn scratch_size(&self) -> usize {
        self.scratch.len()
    }

    pub fn remaining_bytes(&self) -> usize {
        self.chain.available_bytes().saturating_sub(self.local_offset)
    }

    /// True if `bytes` more bytes remain anywhere in the chain.
    pub fn available(&self, bytes: usize) -> bool {
        bytes <= self.remaining_bytes()
    }

    /// True if `bytes` bytes exist starting at `offset` (relative to the
    /// start of the chain's current buffer).
    pub fn available_at(&self, bytes: usize, offset: usize) -> bool {
        bytes <= self.chain.available_bytes().saturating_sub(offset)
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
            Err(Error::underflow(
                bytes,
                self.chain.available_bytes().saturating_sub(offset),
            ))
        }
    }

    // ── Cursor movement ─────────────────────────────────────────────────────

    /// Advance both offsets, crossing into following buffers as needed.
    /// Landing exactly on the end of the last buffer leaves the crossing
    /// pending rather than leaving the chain.
    pub fn advance(&mut self, bytes: usize) -> Result<()> {
        self.require(bytes)?;
        self.local_offset += bytes;
        self.offset += bytes;

        while let Some(len) = self.chain.first().map(ByteBuffer::len) {
            if self.local_offset >= len && self.chain.more_available() {
                trace!("advance: crossing buffer boundary");
                self.local_offset -= len;
                self.chain.advance();
            } else {
                break;
            }
        }
        Ok(())
    }

    /// Rewind both offsets, crossing back into earlier buffers as needed.
    pub fn rewind(&mut self, bytes: usize) -> Result<()> {
        if bytes > self.offset {
            return Err(Error::underflow(bytes, self.offset));
        }

        let mut local = self.local_offset as i64 - bytes as i64;
        self.offset -= bytes;

        while self.chain.can_rewind() && local < 0 {
            self.chain.rewind();
            if let Some(buffer) = self.chain.first() {
                local += buffer.len() as i64;
            }
        }
        debug_assert!(local >= 0);
        self.local_offset = local.max(0) as usize;
        Ok(())
    }

    /// Go to an absolute stream offset, expressed via advance/rewind.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.offset {
            self.advance(position - self.offset)
        } else if position < self.offset {
            self.rewind(self.offset - position)
        } else {
            Ok(())
        }
    }

    /// Zero both stream offsets.  The chain cursor is left untouched.
    pub fn reset(&mut self) {
        self.local_offset = 0;
        self.offset = 0;
    }

    // ── Byte access ─────────────────────────────────────────────────────────

    /// Read one byte and advance.  Consuming the last byte of the current
    /// buffer moves the chain forward — the sole read-side boundary cross.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.require(1)?;
        let (value, head_len) = {
            let buffer = self.chain.first().ok_or(Error::underflow(1, 0))?;
            (buffer.peek_u8(self.local_offset)?, buffer.len())
        };
        self.local_offset += 1;
        self.offset += 1;

        if self.local_offset == head_len {
            self.local_offset = 0;
            self.chain.advance();
        }
        Ok(value)
    }

    /// Peek the byte at `offset` relative to the start of the chain's
    /// current buffer, walking forward through the chain to find it.
    pub fn peek_u8(&self, offset: usize) -> Result<u8> {
        self.require_at(1, offset)?;
        let mut offset = offset;
        for buffer in self.chain.iter() {
            if buffer.len() > offset {
                return buffer.peek_u8(offset);
            }
            offset -= buffer.len();
        }
        Ok(0)
    }

    fn fill_read(&mut self, bytes: usize) -> Result<()> {
        self.require(bytes)?;
        for i in 0..bytes {
            let value = self.read_u8()?;
            self.scratch[i] = value;
        }
        Ok(())
    }

    fn fill_peek(&mut self, bytes: usize, offset: usize) -> Result<()> {
        self.require_at(bytes, offset)?;
        for i in 0..bytes {
            let value = self.peek_u8(offset + i)?;
            self.scratch[i] = value;
        }
        Ok(())
    }

    // ── Integer reads ───────────────────────────────────────────────────────

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn peek_i8(&self, offset: usize) -> Result<i8> {
        Ok(self.peek_u8(offset)? as i8)
    }

    pub fn read_u16(&mut self, little_endian: bool) -> Result<u16> {
        self.fill_read(2)?;
        Ok(order_read_u16(&self.scratch, little_endian))
    }

    pub fn peek_u16(&mut self, offset: usize, little_endian: bool) -> Result<u16> {
        self.fill_peek(2, offset)?;
        Ok(order_read_u16(&self.scratch, little_endian))
    }

    pub fn read_i16(&mut self, little_endian: bool) -> Result<i16> {
        Ok(self.read_u16(little_endian)? as i16)
    }

    pub fn peek_i16(&mut self, offset: usize, little_endian: bool) -> Result<i16> {
        Ok(self.peek_u16(offset, little_endian)? as i16)
    }

    pub fn read_u24(&mut self, little_endian: bool) -> Result<u32> {
        self.fill_read(3)?;
        Ok(order_read_uint(&self.scratch[..3], 3, little_endian) as u32)
    }

    pub fn peek_u24(&mut self, offset: usize, little_endian: bool) -> Result<u32> {
        self.fill_peek(3, offset)?;
        Ok(order_read_uint(&self.scratch[..3], 3, little_endian) as u32)
    }

    pub fn read_i24(&mut self, little_endian: bool) -> Result<i32> {
        self.fill_read(3)?;
        Ok(order_read_int(&self.scratch[..3], 3, little_endian) as i32)
    }

    pub fn peek_i24(&mut self, offset: usize, little_endian: bool) -> Result<i32> {
        self.fill_peek(3, offset)?;
        Ok(order_read_int(&self.scratch[..3], 3, little_endian) as i32)
    }

    pub fn read_u32(&mut self, little_endian: bool) -> Result<u32> {
        self.fill_read(4)?;
        Ok(order_read_u32(&self.scratch, little_endian))
    }

    pub fn peek_u32(&mut self, offset: usize, little_endian: bool) -> Result<u32> {
        self.fill_peek(4, offset)?;
        Ok(order_read_u32(&self.scratch, little_endian))
    }

    pub fn read_i32(&mut self, little_endian: bool) -> Result<i32> {
        Ok(self.read_u32(little_endian)? as i32)
    }

    pub fn peek_i32(&mut self, offset: usize, little_endian: bool) -> Result<i32> {
        Ok(self.peek_u32(offset, little_endian)? as i32)
    }

    // ── Float reads ─────────────────────────────────────────────────────────

    pub fn read_f32(&mut self, little_endian: bool) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32(little_endian)?))
    }

    pub fn peek_f32(&mut self, offset: usize, little_endian: bool) -> Result<f32> {
        Ok(f32::from_bits(self.peek_u32(offset, little_endian)?))
    }

    pub fn read_f64(&mut self, little_endian: bool) -> Result<f64> {
        self.fill_read(8)?;
        Ok(order_read_f64(&self.scratch, little_endian))
    }

    pub fn peek_f64(&mut self, offset: usize, little_endian: bool) -> Result<f64> {
        self.fill_peek(8, offset)?;
        Ok(order_read_f64(&self.scratch, little_endian))
    }

    pub fn read_f48(&mut self, little_endian: bool) -> Result<f64> {
        self.fill_read(6)?;
        Ok(float48(self.take_array::<6>(little_endian)))
    }

    pub fn peek_f48(&mut self, offset: usize, little_endian: bool) -> Result<f64> {
        self.fill_peek(6, offset)?;
        Ok(float48(self.take_array::<6>(little_endian)))
    }

    pub fn read_f80(&mut self, little_endian: bool) -> Result<f64> {
        self.fill_read(10)?;
        Ok(float80(self.take_array::<10>(little_endian)))
    }

    pub fn peek_f80(&mut self, offset: usize, little_endian: bool) -> Result<f64> {
        self.fill_peek(10, offset)?;
        Ok(float80(self.take_array::<10>(little_endian)))
    }

    /// Copy the filled scratch prefix out, reversed for big-endian layouts.
    fn take_array<const N: usize>(&self, little_endian: bool) -> [u8; N] {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.scratch[..N]);
        if !little_endian {
            bytes.reverse();
        }
        bytes
    }

    // ── Bit access ──────────────────────────────────────────────────────────

    /// Same contract as [`ByteBuffer::peek_bit`].
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

    // ── Buffers ─────────────────────────────────────────────────────────────

    /// Read `length` bytes into a new buffer, crossing boundaries as needed.
    pub fn read_buffer(&mut self, length: usize) -> Result<ByteBuffer> {
        self.require(length)?;
        let mut to = vec![0u8; length];
        for slot in to.iter_mut() {
            *slot = self.read_u8()?;
        }
        Ok(ByteBuffer::from(to))
    }

    pub fn peek_buffer(&self, offset: usize, length: usize) -> Result<ByteBuffer> {
        self.require_at(length, offset)?;
        let mut to = vec![0u8; length];
        for (i, slot) in to.iter_mut().enumerate() {
            *slot = self.peek_u8(offset + i)?;
        }
        Ok(ByteBuffer::from(to))
    }

    /// Read up to `length` bytes from the current buffer only.  The result
    /// may be shorter than requested when the current buffer ends first.
    pub fn read_single_buffer(&mut self, length: usize) -> Result<ByteBuffer> {
        debug!("read_single_buffer: {length}");
        let result = match self.chain.first() {
            Some(buffer) => buffer.slice(self.local_offset, length),
            None => return Err(Error::underflow(length, 0)),
        };
        self.advance(result.len())?;
        Ok(result)
    }

    pub fn peek_single_buffer(&self, offset: usize, length: usize) -> Result<ByteBuffer> {
        match self.chain.first() {
            Some(buffer) => Ok(buffer.slice(self.local_offset + offset, length)),
            None => Err(Error::underflow(length, 0)),
        }
    }

    // ── Strings ─────────────────────────────────────────────────────────────

    /// Read a string from the stream cursor; bytes may span buffer
    /// boundaries.  `length` of `None` selects null-terminated decoding.
    pub fn read_string(&mut self, length: Option<usize>, encoding: StringEncoding) -> Result<String> {
        self.decode_string(self.local_offset, length, encoding, true)
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

    // ── Lookahead and comparison ────────────────────────────────────────────

    /// Non-throwing lookahead: true iff the upcoming bytes equal
    /// `candidate`.  False on mismatch, on insufficient remaining bytes, and
    /// for empty candidates.
    pub fn next(&self, candidate: &[u8]) -> bool {
        if candidate.is_empty() || !self.available(candidate.len()) {
            return false;
        }
        for (i, &expected) in candidate.iter().enumerate() {
            match self.peek_u8(self.local_offset + i) {
                Ok(byte) if byte == expected => {}
                _ => return false,
            }
        }
        true
    }

    /// Consume both streams comparing byte-for-byte over the input's
    /// available bytes.  False on the first difference or on underflow.
    pub fn compare(&mut self, input: &mut ByteStream, offset: usize) -> bool {
        let mut available = input.chain.available_bytes();
        if available == 0 {
            debug!("compare: no input provided");
            return false;
        }
        if offset != 0 {
            available = available.saturating_sub(offset);
            if self.seek(offset).is_err() || input.seek(offset).is_err() {
                return false;
            }
        }
        for _ in 0..available {
            match (self.read_u8(), input.read_u8()) {
                (Ok(local), Ok(external)) if local == external => {}
                _ => return false,
            }
        }
        true
    }

    /// A snapshot for speculative parsing: an independent chain cursor with
    /// identical local/global offsets.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}
