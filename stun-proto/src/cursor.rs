//! Bit level cursors over network order buffers.
//!
//! [`BitCursor`] reads fields of any width between 1 and 128 bits, either at an absolute
//! bit offset or sequentially. [`BitWriter`] is its writing counterpart. Both treat the
//! buffer as big-endian at the byte and at the bit level, and fail with
//! [`OutOfRange`](crate::StunErrorType::OutOfRange) when a span does not fit.

use crate::error::{StunError, StunErrorType};
use byteorder::{BigEndian, ByteOrder};

const MAX_WIDTH: usize = 128;

fn check_width(width: usize) -> Result<(), StunError> {
    if width == 0 || width > MAX_WIDTH {
        return Err(StunError::new(
            StunErrorType::InvalidParam,
            format!("Field width must be in 1..=128 bits, got {}", width),
        ));
    }
    Ok(())
}

fn check_span(offset: usize, width: usize, total_bits: usize) -> Result<(), StunError> {
    match offset.checked_add(width) {
        Some(end) if end <= total_bits => Ok(()),
        _ => Err(StunError::new(
            StunErrorType::OutOfRange,
            format!(
                "Span of {} bits at bit offset {} exceeds buffer of {} bits",
                width, offset, total_bits
            ),
        )),
    }
}

fn is_fast_path(offset: usize, width: usize) -> bool {
    offset % 8 == 0 && matches!(width, 8 | 16 | 32 | 64 | 128)
}

/// Reading cursor over a byte buffer.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> BitCursor<'a> {
    /// Creates a cursor positioned at the first bit of `buffer`
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Current position, in bits
    pub fn bit_position(&self) -> usize {
        self.position
    }

    /// Current position, in whole bytes
    pub fn byte_position(&self) -> usize {
        self.position / 8
    }

    /// Number of bits not read yet
    pub fn remaining_bits(&self) -> usize {
        self.buffer.len() * 8 - self.position
    }

    /// Number of whole bytes not read yet
    pub fn remaining_bytes(&self) -> usize {
        self.remaining_bits() / 8
    }

    /// Returns `true` when every bit has been consumed
    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0
    }

    /// Reads `width` bits starting at the absolute bit `offset` without moving the cursor.
    pub fn read_bits_at(&self, offset: usize, width: usize) -> Result<u128, StunError> {
        check_width(width)?;
        check_span(offset, width, self.buffer.len() * 8)?;

        if is_fast_path(offset, width) {
            let bytes = &self.buffer[offset / 8..(offset + width) / 8];
            let value = match width {
                8 => u128::from(bytes[0]),
                16 => u128::from(BigEndian::read_u16(bytes)),
                32 => u128::from(BigEndian::read_u32(bytes)),
                64 => u128::from(BigEndian::read_u64(bytes)),
                _ => BigEndian::read_u128(bytes),
            };
            return Ok(value);
        }

        let mut value: u128 = 0;
        for bit in offset..offset + width {
            let byte = self.buffer[bit / 8];
            let set = (byte >> (7 - (bit % 8))) & 0x01;
            value = (value << 1) | u128::from(set);
        }
        Ok(value)
    }

    /// Reads `width` bits at the cursor position and advances the cursor.
    pub fn read_bits(&mut self, width: usize) -> Result<u128, StunError> {
        let value = self.read_bits_at(self.position, width)?;
        self.position += width;
        Ok(value)
    }

    /// Reads a `u8` and advances the cursor
    pub fn read_u8(&mut self) -> Result<u8, StunError> {
        // Width 8 never yields more than 8 bits
        Ok(self.read_bits(8)? as u8)
    }

    /// Reads a `u16` and advances the cursor
    pub fn read_u16(&mut self) -> Result<u16, StunError> {
        Ok(self.read_bits(16)? as u16)
    }

    /// Reads a `u32` and advances the cursor
    pub fn read_u32(&mut self) -> Result<u32, StunError> {
        Ok(self.read_bits(32)? as u32)
    }

    /// Borrows the next `size` bytes. The cursor must be byte aligned.
    pub fn read_bytes(&mut self, size: usize) -> Result<&'a [u8], StunError> {
        self.check_aligned()?;
        let start = self.byte_position();
        check_span(self.position, size.saturating_mul(8), self.buffer.len() * 8)?;
        self.position += size * 8;
        Ok(&self.buffer[start..start + size])
    }

    /// Borrows every byte left. The cursor must be byte aligned.
    pub fn read_remaining(&mut self) -> Result<&'a [u8], StunError> {
        self.read_bytes(self.remaining_bytes())
    }

    /// Advances the cursor `size` bytes.
    pub fn skip_bytes(&mut self, size: usize) -> Result<(), StunError> {
        self.read_bytes(size).map(|_| ())
    }

    /// Returns a cursor bounded to the next `size` bytes and advances this one past them.
    pub fn sub_cursor(&mut self, size: usize) -> Result<BitCursor<'a>, StunError> {
        let bytes = self.read_bytes(size)?;
        Ok(BitCursor::new(bytes))
    }

    fn check_aligned(&self) -> Result<(), StunError> {
        if self.position % 8 != 0 {
            return Err(StunError::new(
                StunErrorType::InvalidParam,
                format!("Cursor is not byte aligned, bit position {}", self.position),
            ));
        }
        Ok(())
    }
}

/// Writing cursor over a mutable byte buffer.
#[derive(Debug)]
pub struct BitWriter<'a> {
    buffer: &'a mut [u8],
    position: usize,
}

impl<'a> BitWriter<'a> {
    /// Creates a writer positioned at the first bit of `buffer`
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Current position, in bits
    pub fn bit_position(&self) -> usize {
        self.position
    }

    /// Current position, in whole bytes
    pub fn byte_position(&self) -> usize {
        self.position / 8
    }

    /// Bytes written so far
    pub fn written(&self) -> &[u8] {
        &self.buffer[..self.byte_position()]
    }

    /// Writes the `width` low bits of `value` at the cursor position and advances it.
    pub fn write_bits(&mut self, value: u128, width: usize) -> Result<(), StunError> {
        check_width(width)?;
        if width < MAX_WIDTH && value >> width != 0 {
            return Err(StunError::new(
                StunErrorType::InvalidParam,
                format!("Value {:#x} does not fit in {} bits", value, width),
            ));
        }
        check_span(self.position, width, self.buffer.len() * 8)?;

        if is_fast_path(self.position, width) {
            let start = self.position / 8;
            let bytes = &mut self.buffer[start..start + width / 8];
            match width {
                8 => bytes[0] = value as u8,
                16 => BigEndian::write_u16(bytes, value as u16),
                32 => BigEndian::write_u32(bytes, value as u32),
                64 => BigEndian::write_u64(bytes, value as u64),
                _ => BigEndian::write_u128(bytes, value),
            }
        } else {
            for i in 0..width {
                let bit = self.position + i;
                let mask = 0x80u8 >> (bit % 8);
                if (value >> (width - 1 - i)) & 0x01 == 1 {
                    self.buffer[bit / 8] |= mask;
                } else {
                    self.buffer[bit / 8] &= !mask;
                }
            }
        }

        self.position += width;
        Ok(())
    }

    /// Writes a `u8` and advances the cursor
    pub fn write_u8(&mut self, value: u8) -> Result<(), StunError> {
        self.write_bits(u128::from(value), 8)
    }

    /// Writes a `u16` and advances the cursor
    pub fn write_u16(&mut self, value: u16) -> Result<(), StunError> {
        self.write_bits(u128::from(value), 16)
    }

    /// Writes a `u32` and advances the cursor
    pub fn write_u32(&mut self, value: u32) -> Result<(), StunError> {
        self.write_bits(u128::from(value), 32)
    }

    /// Copies `bytes` at the cursor position. The cursor must be byte aligned.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), StunError> {
        self.check_aligned()?;
        check_span(
            self.position,
            bytes.len().saturating_mul(8),
            self.buffer.len() * 8,
        )?;
        let start = self.byte_position();
        self.buffer[start..start + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len() * 8;
        Ok(())
    }

    /// Advances the writer `size` bytes, keeping the content already in the buffer.
    pub fn skip_bytes(&mut self, size: usize) -> Result<(), StunError> {
        self.check_aligned()?;
        check_span(self.position, size.saturating_mul(8), self.buffer.len() * 8)?;
        self.position += size * 8;
        Ok(())
    }

    /// Writes `size` copies of `value`.
    pub fn pad_with(&mut self, size: usize, value: u8) -> Result<(), StunError> {
        self.check_aligned()?;
        check_span(self.position, size.saturating_mul(8), self.buffer.len() * 8)?;
        let start = self.byte_position();
        self.buffer[start..start + size].fill(value);
        self.position += size * 8;
        Ok(())
    }

    /// Writes `value` bytes until the position is a multiple of `alignment` bytes.
    pub fn pad_to(&mut self, alignment: usize, value: u8) -> Result<(), StunError> {
        if alignment == 0 {
            return Err(StunError::new(
                StunErrorType::InvalidParam,
                "Alignment can not be zero",
            ));
        }
        let rem = self.byte_position() % alignment;
        if rem == 0 {
            return Ok(());
        }
        self.pad_with(alignment - rem, value)
    }

    /// Overwrites a big-endian `u16` at `byte_offset`, which must have been written already.
    pub fn write_u16_at(&mut self, byte_offset: usize, value: u16) -> Result<(), StunError> {
        check_span(byte_offset.saturating_mul(8), 16, self.position)?;
        BigEndian::write_u16(&mut self.buffer[byte_offset..byte_offset + 2], value);
        Ok(())
    }

    fn check_aligned(&self) -> Result<(), StunError> {
        if self.position % 8 != 0 {
            return Err(StunError::new(
                StunErrorType::InvalidParam,
                format!("Writer is not byte aligned, bit position {}", self.position),
            ));
        }
        Ok(())
    }
}
