//! CRC-24Q checksum used to protect RTCM 3 frames.
//!
//! Parameters:
//! - Poly:    0x1864CFB
//! - Init:    0x000000
//! - RefIn:   false
//! - RefOut:  false
//! - XorOut:  0x000000
//!
//! The checksum covers the whole frame except itself: preamble, reserved
//! bits, length field and payload.

#![allow(clippy::cast_possible_truncation)]

/// CRC-24Q generator polynomial, including the x^24 term.
pub const CRC24Q_POLY: u32 = 0x0186_4CFB;

/// Byte-at-a-time lookup table, built at compile time.
static CRC24Q_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 16;
        let mut bit = 0;
        while bit < 8 {
            crc <<= 1;
            if crc & 0x0100_0000 != 0 {
                crc ^= CRC24Q_POLY;
            }
            bit += 1;
        }
        table[i] = crc & 0x00FF_FFFF;
        i += 1;
    }
    table
}

/// Compute the CRC-24Q of `data`.
///
/// # Returns
/// The checksum in the low 24 bits.
pub fn crc24q(data: &[u8]) -> u32 {
    data.iter().fold(0u32, |crc, &byte| {
        let index = ((crc >> 16) as u8 ^ byte) as usize;
        ((crc << 8) & 0x00FF_FFFF) ^ CRC24Q_TABLE[index]
    })
}
