//! Bit field insertion for building RTCM frames.
//!
//! The frame generator reuses one output buffer for every message, so writes
//! overwrite whatever bits were there: each bit is explicitly set or cleared.
//!
//! ## Bit Ordering
//! Bits are written MSB-first within each byte:
//! - First bit written goes to bit position 7
//! - Second bit goes to position 6, etc.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use crate::error::FrameError;

/// Insert the low `len` bits (0-32) of `value` at bit `pos`.
///
/// Bits of `value` above `len` are ignored. The caller sizes `data` to cover
/// `pos + len` bits.
///
/// # Panics
/// Panics if the field runs past the end of `data`.
#[inline]
pub fn set_bits(data: &mut [u8], pos: usize, len: usize, value: u32) {
    let mut bit_pos = pos;
    let mut bits_remaining = len;

    while bits_remaining > 0 {
        let byte_index = bit_pos >> 3;
        let bit_offset = bit_pos & 7;
        let bits_in_byte = 8 - bit_offset;
        let bits_to_write = bits_remaining.min(bits_in_byte);

        // Place the next `bits_to_write` bits of value under the mask
        let shift = bits_in_byte - bits_to_write;
        let mask = (((1u32 << bits_to_write) - 1) as u8) << shift;
        let bits = ((value >> (bits_remaining - bits_to_write)) as u8) << shift;

        data[byte_index] = (data[byte_index] & !mask) | (bits & mask);

        bit_pos += bits_to_write;
        bits_remaining -= bits_to_write;
    }
}

/// Sequential bit writer over a fixed output buffer.
///
/// Body encoders receive one of these positioned just after the frame header;
/// the frame generator reads [`BitWriter::position`] back as the new cursor.
#[derive(Debug)]
pub struct BitWriter<'a> {
    /// Output buffer.
    data: &'a mut [u8],
    /// Current bit position.
    bit_pos: usize,
}

impl<'a> BitWriter<'a> {
    /// Create a writer positioned at the first bit of `data`.
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Get current bit position.
    #[inline]
    pub fn position(&self) -> usize {
        self.bit_pos
    }

    /// Total capacity in bits.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len() * 8
    }

    /// Number of bits that can still be written.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity().saturating_sub(self.bit_pos)
    }

    /// Append an unsigned field.
    ///
    /// # Arguments
    /// * `value` - Value containing bits (right-justified)
    /// * `num_bits` - Number of bits to append (1-32)
    ///
    /// # Returns
    /// `Ok(())` on success, error on a bad width or if the buffer would overflow.
    pub fn write_bits(&mut self, value: u32, num_bits: usize) -> Result<(), FrameError> {
        if num_bits == 0 || num_bits > 32 {
            return Err(FrameError::InvalidWidth(num_bits));
        }

        if self.remaining() < num_bits {
            return Err(FrameError::BufferOverflow {
                pos: self.bit_pos,
                width: num_bits,
                capacity: self.capacity(),
            });
        }

        set_bits(self.data, self.bit_pos, num_bits, value);
        self.bit_pos += num_bits;
        Ok(())
    }

    /// Append a two's complement field.
    pub fn write_signed(&mut self, value: i32, num_bits: usize) -> Result<(), FrameError> {
        self.write_bits(value as u32, num_bits)
    }

    /// Append whole bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), FrameError> {
        if self.remaining() < bytes.len() * 8 {
            return Err(FrameError::BufferOverflow {
                pos: self.bit_pos,
                width: bytes.len() * 8,
                capacity: self.capacity(),
            });
        }

        for &byte in bytes {
            self.write_bits(u32::from(byte), 8)?;
        }
        Ok(())
    }

    /// Pad with zero bits up to the next byte boundary.
    pub fn pad_to_byte(&mut self) -> Result<(), FrameError> {
        let bit_offset = self.bit_pos % 8;
        if bit_offset != 0 {
            self.write_bits(0, 8 - bit_offset)?;
        }
        Ok(())
    }
}
