//! Word parity for RTCM 2 frames.
//!
//! RTCM 2 borrows the GPS navigation message word format: each 30-bit word
//! carries 24 data bits (d1..d24) followed by 6 parity bits (D25..D30). The
//! parity equations also cover the last two bits of the previous word (D29*,
//! D30*), and when D30* is set the data bits are transmitted complemented.
//!
//! Words are handled as `u32` values laid out as:
//!
//! ```text
//!  31    30    29 ......... 6  5 ...... 0
//! D29*  D30*   d1 ........ d24 D25 ... D30
//! ```

#![allow(clippy::cast_possible_truncation)]

/// Parity masks for D25..D30 over the word layout above.
const HAMMING: [u32; 6] = [
    0xBB1F_3480,
    0x5D8F_9A40,
    0xAEC7_CD00,
    0x5763_E680,
    0x6BB1_F340,
    0x8B7A_89C0,
];

/// D30* of the previous word.
const D30_STAR: u32 = 0x4000_0000;

/// Data bits d1..d24.
const DATA_MASK: u32 = 0x3FFF_FFC0;

/// Compute D25..D30 for a word whose data bits are not complemented.
fn parity_bits(word: u32) -> u32 {
    HAMMING
        .iter()
        .fold(0, |parity, &mask| (parity << 1) | ((word & mask).count_ones() & 1))
}

/// Check the parity of a coded word and recover its data bytes.
///
/// # Arguments
/// * `word` - Previous word's D29*/D30* in bits 31-30, coded word in bits 29-0
///
/// # Returns
/// The three data bytes d1..d24, or `None` if the parity does not match.
pub fn decode_word(word: u32) -> Option<[u8; 3]> {
    let word = if word & D30_STAR != 0 {
        word ^ DATA_MASK
    } else {
        word
    };

    if parity_bits(word) != word & 0x3F {
        return None;
    }

    Some([(word >> 22) as u8, (word >> 14) as u8, (word >> 6) as u8])
}

/// Encode three data bytes into a coded word.
///
/// # Arguments
/// * `prev` - Previous transmitted word (only D29*/D30*, its low 2 bits, are used)
/// * `data` - Data bytes d1..d24
///
/// # Returns
/// The word in the layout accepted by [`decode_word`]; the low 30 bits are
/// what goes on the wire.
pub fn encode_word(prev: u32, data: [u8; 3]) -> u32 {
    let d = (u32::from(data[0]) << 16) | (u32::from(data[1]) << 8) | u32::from(data[2]);
    let mut word = ((prev & 0x3) << 30) | (d << 6);
    let parity = parity_bits(word);

    if word & D30_STAR != 0 {
        word ^= DATA_MASK;
    }

    word | parity
}
