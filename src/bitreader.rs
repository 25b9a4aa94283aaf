//! Bit field extraction for RTCM frames.
//!
//! RTCM packs every field MSB-first with no alignment, so a field is located
//! by its absolute bit offset from the start of the buffer.
//!
//! ## Bit Ordering
//! Bits are read MSB-first within each byte:
//! - Bit position 0 in a byte is bit 7 (MSB)
//! - Bit position 7 in a byte is bit 0 (LSB)

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

use crate::error::FrameError;

/// Extract an unsigned field of `len` bits (0-32) starting at bit `pos`.
///
/// The caller sizes `data` to cover `pos + len` bits.
///
/// # Panics
/// Panics if the field runs past the end of `data`.
#[inline]
pub fn get_bits(data: &[u8], pos: usize, len: usize) -> u32 {
    let mut value = 0u32;
    let mut bit_pos = pos;
    let mut bits_remaining = len;

    while bits_remaining > 0 {
        let byte_index = bit_pos >> 3; // / 8
        let bit_offset = bit_pos & 7; // % 8
        let bits_in_byte = 8 - bit_offset;
        let bits_to_read = bits_remaining.min(bits_in_byte);

        // Extract bits from current byte (MSB-first)
        let shift = bits_in_byte - bits_to_read;
        let mask = ((1u32 << bits_to_read) - 1) as u8;
        let bits = (data[byte_index] >> shift) & mask;

        value = (value << bits_to_read) | u32::from(bits);
        bit_pos += bits_to_read;
        bits_remaining -= bits_to_read;
    }

    value
}

/// Extract a two's complement field of `len` bits (1-32) starting at bit `pos`.
///
/// # Panics
/// Panics if the field runs past the end of `data`.
#[inline]
pub fn get_bits_signed(data: &[u8], pos: usize, len: usize) -> i32 {
    let bits = get_bits(data, pos, len);
    if len == 0 || len >= 32 {
        return bits as i32;
    }
    let shift = 32 - len;
    ((bits << shift) as i32) >> shift
}

/// Sequential bit reader over a verified frame.
///
/// Reads bits MSB-first from a byte slice, refusing to run past `num_bits`.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    /// Source data.
    data: &'a [u8],
    /// Total number of bits available.
    num_bits: usize,
    /// Current bit position.
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader.
    ///
    /// # Arguments
    /// * `data` - Source byte slice
    /// * `num_bits` - Total number of valid bits in the data
    pub fn new(data: &'a [u8], num_bits: usize) -> Self {
        Self {
            data,
            num_bits: num_bits.min(data.len() * 8),
            bit_pos: 0,
        }
    }

    /// Create a reader over every bit of `data`.
    pub fn from_bytes(data: &'a [u8]) -> Self {
        Self::new(data, data.len() * 8)
    }

    /// Get current bit position.
    #[inline]
    pub fn position(&self) -> usize {
        self.bit_pos
    }

    /// Get number of remaining bits.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.num_bits.saturating_sub(self.bit_pos)
    }

    /// Check if there are more bits to read.
    #[inline]
    pub fn has_bits(&self) -> bool {
        self.bit_pos < self.num_bits
    }

    /// Read a single bit.
    ///
    /// # Returns
    /// The bit value (0 or 1), or error if no bits remain.
    #[inline]
    pub fn read_bit(&mut self) -> Result<u8, FrameError> {
        Ok(self.read_bits(1)? as u8)
    }

    /// Read an unsigned field.
    ///
    /// # Arguments
    /// * `num_bits` - Number of bits to read (1-32)
    ///
    /// # Returns
    /// The bits packed into a u32 (right-justified), or error.
    #[inline]
    pub fn read_bits(&mut self, num_bits: usize) -> Result<u32, FrameError> {
        if num_bits == 0 || num_bits > 32 {
            return Err(FrameError::InvalidWidth(num_bits));
        }

        if self.remaining() < num_bits {
            return Err(FrameError::Underflow);
        }

        let value = get_bits(self.data, self.bit_pos, num_bits);
        self.bit_pos += num_bits;
        Ok(value)
    }

    /// Read a two's complement field.
    ///
    /// # Arguments
    /// * `num_bits` - Number of bits to read (1-32)
    pub fn read_signed(&mut self, num_bits: usize) -> Result<i32, FrameError> {
        if num_bits == 0 || num_bits > 32 {
            return Err(FrameError::InvalidWidth(num_bits));
        }

        if self.remaining() < num_bits {
            return Err(FrameError::Underflow);
        }

        let value = get_bits_signed(self.data, self.bit_pos, num_bits);
        self.bit_pos += num_bits;
        Ok(value)
    }

    /// Align to next byte boundary.
    ///
    /// Skips remaining bits in the current byte if not already aligned.
    pub fn align_byte(&mut self) {
        let bit_offset = self.bit_pos % 8;
        if bit_offset != 0 {
            self.bit_pos += 8 - bit_offset;
        }
    }

    /// Skip a number of bits.
    ///
    /// # Returns
    /// Ok(()) on success, or error if not enough bits remain.
    pub fn skip(&mut self, count: usize) -> Result<(), FrameError> {
        if self.remaining() < count {
            return Err(FrameError::Underflow);
        }

        self.bit_pos += count;
        Ok(())
    }
}
