//! Stream builders shared by the integration tests.

#![allow(dead_code)]

use rtcmframe::{
    crc24q, encode_word, set_bits, DecodeStatus, Format, Frame, MessageDecoder, RTCM2_PREAMBLE,
};

/// Reference station ARP message (type 1005) from the RTCM 3 standard.
pub const SAMPLE_1005: [u8; 25] = [
    0xD3, 0x00, 0x13, 0x3E, 0xD7, 0xD3, 0x02, 0x02, 0x98, 0x0E, 0xDE, 0xEF, 0x34, 0xB4, 0xBD, 0x62,
    0xAC, 0x09, 0x41, 0x98, 0x6F, 0x33, 0x36, 0x0B, 0x98,
];

/// Build an RTCM 3 frame around `payload` (at most 1023 bytes).
pub fn rtcm3_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0u8; 3];
    set_bits(&mut frame, 0, 8, 0xD3);
    set_bits(&mut frame, 14, 10, payload.len() as u32);
    frame.extend_from_slice(payload);

    let crc = crc24q(&frame);
    frame.extend_from_slice(&[(crc >> 16) as u8, (crc >> 8) as u8, crc as u8]);
    frame
}

/// De-framed RTCM 2 message with `data_words` words of payload.
pub fn rtcm2_message(message_type: u32, station: u32, data_words: usize) -> Vec<u8> {
    let mut data = vec![0u8; 6 + data_words * 3];
    set_bits(&mut data, 0, 8, u32::from(RTCM2_PREAMBLE));
    set_bits(&mut data, 8, 6, message_type);
    set_bits(&mut data, 14, 10, station);
    set_bits(&mut data, 24, 13, 1234);
    set_bits(&mut data, 37, 3, 5);
    set_bits(&mut data, 40, 5, data_words as u32);
    for (i, byte) in data[6..].iter_mut().enumerate() {
        *byte = (i as u8).wrapping_mul(37).wrapping_add(11);
    }
    data
}

/// Parity-encode consecutive de-framed messages into 30-bit words.
///
/// The first word is encoded against a zero carry; each following word uses
/// the previous one.
pub fn rtcm2_words(messages: &[Vec<u8>]) -> Vec<u32> {
    let mut prev = 0;
    let mut words = Vec::new();
    for message in messages {
        for group in message.chunks(3) {
            let word = encode_word(prev, [group[0], group[1], group[2]]);
            words.push(word);
            prev = word;
        }
    }
    words
}

/// Pack 30-bit words into 6-of-8 bytes, least significant bit first.
pub fn pack_6of8(words: &[u32]) -> Vec<u8> {
    let bits: Vec<u8> = words
        .iter()
        .flat_map(|&w| (0..30).rev().map(move |i| ((w >> i) & 1) as u8))
        .collect();
    bits.chunks(6)
        .map(|c| {
            c.iter()
                .enumerate()
                .fold(0x40, |byte, (i, &bit)| byte | (bit << i))
        })
        .collect()
}

/// Byte stream carrying `messages` back to back.
pub fn rtcm2_stream(messages: &[Vec<u8>]) -> Vec<u8> {
    pack_6of8(&rtcm2_words(messages))
}

/// One delivered frame, copied out of the synchronizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivered {
    pub format: Format,
    pub message_type: u16,
    pub bytes: Vec<u8>,
    pub payload: Vec<u8>,
}

/// Decoder keeping a copy of every frame.
#[derive(Debug)]
pub struct Recorder {
    pub frames: Vec<Delivered>,
    pub status: DecodeStatus,
}

impl Recorder {
    pub fn new(status: DecodeStatus) -> Self {
        Self {
            frames: Vec::new(),
            status,
        }
    }
}

impl MessageDecoder for Recorder {
    fn decode(&mut self, frame: &Frame<'_>) -> DecodeStatus {
        self.frames.push(Delivered {
            format: frame.format(),
            message_type: frame.message_type(),
            bytes: frame.bytes().to_vec(),
            payload: frame.payload().to_vec(),
        });
        self.status
    }
}
