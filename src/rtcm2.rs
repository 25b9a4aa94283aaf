//! RTCM 2 frame synchronization.
//!
//! RTCM 2 frames are sequences of 30-bit parity words. On the wire every byte
//! is marked `01` in its top two bits and carries six message bits, least
//! significant first ("6-of-8" form). A frame starts with a two-word header:
//!
//! ```text
//! word 1: preamble 0x66 (8) | message type (6) | station id (10) | parity (6)
//! word 2: modified Z-count (13) | sequence (3) | word count (5) | health (3) | parity (6)
//! ```
//!
//! The word count gives the number of data words following the header, so the
//! de-framed length is `word_count * 3 + 6` bytes.

#![allow(clippy::cast_possible_truncation)]

use tracing::{debug, trace};

use crate::bitreader::get_bits;
use crate::error::FrameError;
use crate::frame::{
    alloc_buffer, BodyEncoder, ByteSink, Format, Frame, FrameEvent, FrameGenerator,
    MessageDecoder,
};
use crate::parity::decode_word;

/// Frame preamble, first byte of the header word.
pub const RTCM2_PREAMBLE: u8 = 0x66;

/// Largest de-framed frame: 31 data words plus the header.
pub const RTCM2_MAX_FRAME_LEN: usize = 31 * 3 + 6;

/// Bits of the rolling word kept across a frame boundary.
///
/// They are D29*/D30* for the next word's parity. This carry is kept even
/// after a parity failure, matching deployed receivers.
pub const PARITY_CARRY_MASK: u32 = 0x3;

/// Coded word length in bits.
const WORD_BITS: usize = 30;

/// Message bits carried by one input byte.
const BITS_PER_BYTE: usize = 6;

/// Bytes decoded from one word.
const WORD_BYTES: usize = 3;

/// Input byte marker: top two bits must be `01`.
const MARKER_MASK: u8 = 0xC0;
const MARKER: u8 = 0x40;

/// Two-word RTCM 2 header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rtcm2Header {
    /// Message type (1-63).
    pub message_type: u16,
    /// Reference station id.
    pub station_id: u16,
    /// Modified Z-count, 0.6 s units within the hour.
    pub z_count: u16,
    /// Sequence number.
    pub sequence: u8,
    /// Number of data words after the header.
    pub word_count: u8,
    /// Station health.
    pub health: u8,
}

impl Rtcm2Header {
    /// Parse the header from de-framed bytes.
    ///
    /// # Returns
    /// The header, or `None` if fewer than 6 bytes are given.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Format::Rtcm2.header_len() {
            return None;
        }

        Some(Self {
            message_type: get_bits(data, 8, 6) as u16,
            station_id: get_bits(data, 14, 10) as u16,
            z_count: get_bits(data, 24, 13) as u16,
            sequence: get_bits(data, 37, 3) as u8,
            word_count: get_bits(data, 40, 5) as u8,
            health: get_bits(data, 45, 3) as u8,
        })
    }

    /// Seconds into the hour given by the modified Z-count.
    pub fn seconds_of_hour(&self) -> f64 {
        f64::from(self.z_count) * 0.6
    }

    /// De-framed frame length announced by the header.
    pub fn frame_len(&self) -> usize {
        usize::from(self.word_count) * WORD_BYTES + Format::Rtcm2.header_len()
    }
}

/// RTCM 2 frame synchronizer.
///
/// Hunts for the preamble bit by bit, then collects parity-checked words until
/// the header's word count is satisfied and hands the frame to `D`.
pub struct Rtcm2Framer<D> {
    /// De-framed bytes of the frame in progress.
    buf: Vec<u8>,
    /// Bytes decoded so far; 0 while hunting.
    byte_count: usize,
    /// Bits received since the last word boundary.
    bit_count: usize,
    /// Frame length from the header; 0 until the second word arrives.
    declared_len: usize,
    /// Rolling shift register: D29*/D30* in bits 31-30, current word below.
    word: u32,
    /// Frame decoder.
    decoder: D,
}

impl<D> Rtcm2Framer<D> {
    /// Number of de-framed bytes collected for the frame in progress.
    pub fn byte_count(&self) -> usize {
        self.byte_count
    }

    /// Bits received since the last word boundary.
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    /// Declared frame length, or 0 if not yet known.
    pub fn declared_len(&self) -> usize {
        self.declared_len
    }

    /// Current rolling word.
    pub fn word(&self) -> u32 {
        self.word
    }

    /// True while no frame is in progress.
    pub fn is_hunting(&self) -> bool {
        self.byte_count == 0
    }

    /// Shared access to the decoder.
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Mutable access to the decoder.
    pub fn decoder_mut(&mut self) -> &mut D {
        &mut self.decoder
    }

    /// Consume the framer, returning the decoder.
    pub fn into_decoder(self) -> D {
        self.decoder
    }

    /// Back to hunting, keeping the parity carry.
    fn resync(&mut self) {
        self.byte_count = 0;
        self.bit_count = 0;
        self.declared_len = 0;
        self.word &= PARITY_CARRY_MASK;
    }

    /// Check the rolling word for a preamble with valid parity.
    fn sync(&mut self) -> bool {
        let mut preamble = (self.word >> 22) as u8;
        if self.word & 0x4000_0000 != 0 {
            // Data bits are complemented when D30* is set
            preamble ^= 0xFF;
        }
        if preamble != RTCM2_PREAMBLE {
            return false;
        }

        match decode_word(self.word) {
            Some(decoded) => {
                self.buf[..WORD_BYTES].copy_from_slice(&decoded);
                true
            }
            None => false,
        }
    }
}

impl<D: MessageDecoder> Rtcm2Framer<D> {
    /// Create a framer delivering frames to `decoder`.
    ///
    /// # Returns
    /// The framer, or an error if its frame buffer cannot be allocated.
    pub fn new(decoder: D) -> Result<Self, FrameError> {
        Ok(Self {
            buf: alloc_buffer(RTCM2_MAX_FRAME_LEN)?,
            byte_count: 0,
            bit_count: 0,
            declared_len: 0,
            word: 0,
            decoder,
        })
    }

    /// Hand the completed frame to the decoder and start hunting again.
    fn deliver(&mut self) -> FrameEvent {
        let len = self.declared_len;
        self.resync();

        let data = &self.buf[..len];
        let Some(header) = Rtcm2Header::parse(data) else {
            return FrameEvent::NoMessage;
        };

        debug!(
            "rtcm2 frame: type={} station={} len={len}",
            header.message_type, header.station_id
        );

        let frame = Frame::rtcm2(data, header);
        let status = self.decoder.decode(&frame);

        FrameEvent::Message {
            format: Format::Rtcm2,
            message_type: header.message_type,
            status,
        }
    }
}

impl<D: MessageDecoder> ByteSink for Rtcm2Framer<D> {
    fn feed(&mut self, byte: u8) -> FrameEvent {
        trace!("rtcm2 input: data={byte:02x}");

        if byte & MARKER_MASK != MARKER {
            return FrameEvent::NoMessage;
        }

        let mut data = byte;
        let mut event = FrameEvent::NoMessage;

        for _ in 0..BITS_PER_BYTE {
            self.word = (self.word << 1) | u32::from(data & 1);
            data >>= 1;

            if self.byte_count == 0 {
                if self.sync() {
                    self.byte_count = WORD_BYTES;
                    self.bit_count = 0;
                }
                continue;
            }

            self.bit_count += 1;
            if self.bit_count < WORD_BITS {
                continue;
            }
            self.bit_count = 0;

            let Some(decoded) = decode_word(self.word) else {
                debug!(
                    "rtcm2 parity error: word={:08x} bytes={}",
                    self.word, self.byte_count
                );
                self.resync();
                event = FrameEvent::ParityError;
                continue;
            };

            // declared_len <= RTCM2_MAX_FRAME_LEN keeps this in bounds
            self.buf[self.byte_count..self.byte_count + WORD_BYTES].copy_from_slice(&decoded);
            self.byte_count += WORD_BYTES;

            if self.byte_count == Format::Rtcm2.header_len() {
                self.declared_len = usize::from(self.buf[5] >> 3) * WORD_BYTES + 6;
            }
            if self.byte_count < self.declared_len {
                continue;
            }

            // Remaining bits of the byte start the hunt for the next frame
            event = self.deliver();
        }

        event
    }

    fn reset(&mut self) {
        self.resync();
        self.word = 0;
    }
}

/// RTCM 2 frame generator.
///
/// RTCM 2 output is not supported: every request resets the counters and
/// fails with [`FrameError::Unsupported`].
#[derive(Debug, Default)]
pub struct Rtcm2Generator {
    bit_count: usize,
    declared_len: usize,
    byte_count: usize,
}

impl Rtcm2Generator {
    /// Create a generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of the last frame.
    pub fn byte_count(&self) -> usize {
        self.byte_count
    }

    /// Length of the last frame without parity.
    pub fn declared_len(&self) -> usize {
        self.declared_len
    }

    /// Bit cursor of the last frame.
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }
}

impl FrameGenerator for Rtcm2Generator {
    fn generate<E: BodyEncoder + ?Sized>(
        &mut self,
        _encoder: &mut E,
        message_type: u16,
        sync: bool,
    ) -> Result<&[u8], FrameError> {
        debug!("gen_rtcm2: type={message_type} sync={sync}");

        self.bit_count = 0;
        self.declared_len = 0;
        self.byte_count = 0;

        Err(FrameError::Unsupported(Format::Rtcm2))
    }

    fn frame(&self) -> &[u8] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitwriter::set_bits;
    use crate::frame::DecodeStatus;
    use crate::parity::encode_word;

    /// Parity-encode de-framed bytes into words, chaining D29*/D30*.
    fn encode_words(prev: u32, data: &[u8]) -> Vec<u32> {
        let mut prev = prev;
        data.chunks(3)
            .map(|c| {
                let word = encode_word(prev, [c[0], c[1], c[2]]);
                prev = word;
                word
            })
            .collect()
    }

    /// Pack 30-bit words into 6-of-8 bytes, LSB first.
    fn pack_6of8(words: &[u32]) -> Vec<u8> {
        pack_after_zeros(0, words)
    }

    /// Like [`pack_6of8`], after `prefix_bits` zero bits; the last byte is
    /// zero padded.
    fn pack_after_zeros(prefix_bits: usize, words: &[u32]) -> Vec<u8> {
        let bits: Vec<u8> = vec![0u8; prefix_bits]
            .into_iter()
            .chain(
                words
                    .iter()
                    .flat_map(|&w| (0..30).rev().map(move |i| ((w >> i) & 1) as u8)),
            )
            .collect();
        bits.chunks(6)
            .map(|c| {
                c.iter()
                    .enumerate()
                    .fold(MARKER, |byte, (i, &bit)| byte | (bit << i))
            })
            .collect()
    }

    /// De-framed RTCM 2 message with `data_words` words of payload.
    fn message(message_type: u32, station: u32, data_words: usize) -> Vec<u8> {
        let mut data = vec![0u8; 6 + data_words * 3];
        set_bits(&mut data, 0, 8, u32::from(RTCM2_PREAMBLE));
        set_bits(&mut data, 8, 6, message_type);
        set_bits(&mut data, 14, 10, station);
        set_bits(&mut data, 24, 13, 1234);
        set_bits(&mut data, 37, 3, 5);
        set_bits(&mut data, 40, 5, data_words as u32);
        set_bits(&mut data, 45, 3, 0);
        for (i, byte) in data[6..].iter_mut().enumerate() {
            *byte = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        data
    }

    fn recording_framer() -> Rtcm2Framer<impl FnMut(&Frame<'_>) -> DecodeStatus> {
        let mut seen: Vec<Vec<u8>> = Vec::new();
        Rtcm2Framer::new(move |frame: &Frame<'_>| {
            seen.push(frame.bytes().to_vec());
            DecodeStatus::Corrections
        })
        .unwrap()
    }

    fn feed_all<S: ByteSink>(sink: &mut S, bytes: &[u8]) -> Vec<FrameEvent> {
        bytes.iter().map(|&b| sink.feed(b)).collect()
    }

    #[test]
    fn test_rejects_unmarked_bytes() {
        let mut framer = recording_framer();
        for byte in [0x00, 0x3F, 0x80, 0xBF, 0xC0, 0xFF] {
            assert_eq!(framer.feed(byte), FrameEvent::NoMessage);
        }
        assert_eq!(framer.word(), 0);
        assert!(framer.is_hunting());
    }

    #[test]
    fn test_single_frame() {
        let data = message(9, 321, 2);
        let stream = pack_6of8(&encode_words(0, &data));
        assert_eq!(stream.len(), 20);

        let mut delivered = Vec::new();
        let mut framer = Rtcm2Framer::new(|frame: &Frame<'_>| {
            delivered.push((
                frame.bytes().to_vec(),
                *frame.rtcm2_header().unwrap(),
                frame.payload().to_vec(),
            ));
            DecodeStatus::Corrections
        })
        .unwrap();

        let events = feed_all(&mut framer, &stream);
        assert!(events[..19].iter().all(FrameEvent::is_none));
        assert_eq!(
            events[19],
            FrameEvent::Message {
                format: Format::Rtcm2,
                message_type: 9,
                status: DecodeStatus::Corrections,
            }
        );
        assert!(framer.is_hunting());
        drop(framer);

        assert_eq!(delivered.len(), 1);
        let (bytes, header, payload) = &delivered[0];
        assert_eq!(bytes, &data);
        assert_eq!(header.message_type, 9);
        assert_eq!(header.station_id, 321);
        assert_eq!(header.z_count, 1234);
        assert_eq!(header.sequence, 5);
        assert_eq!(header.word_count, 2);
        assert_eq!(header.frame_len(), 12);
        assert_eq!(payload, &data[6..]);
    }

    #[test]
    fn test_header_only_frame() {
        let data = message(6, 1, 0);
        let stream = pack_6of8(&encode_words(0, &data));
        let mut framer = recording_framer();

        let events = feed_all(&mut framer, &stream);
        assert_eq!(events.last().unwrap().status(), Some(DecodeStatus::Corrections));
    }

    #[test]
    fn test_counters_track_progress() {
        let data = message(1, 2, 3);
        let stream = pack_6of8(&encode_words(0, &data));
        let mut framer = recording_framer();

        // First word: 5 bytes, synchronized with 3 bytes decoded
        feed_all(&mut framer, &stream[..5]);
        assert_eq!(framer.byte_count(), 3);
        assert_eq!(framer.bit_count(), 0);
        assert_eq!(framer.declared_len(), 0);

        // Second word carries the word count
        feed_all(&mut framer, &stream[5..10]);
        assert_eq!(framer.byte_count(), 6);
        assert_eq!(framer.declared_len(), 15);

        feed_all(&mut framer, &stream[10..12]);
        assert_eq!(framer.bit_count(), 12);

        let events = feed_all(&mut framer, &stream[12..]);
        assert!(events.last().unwrap().status().is_some());
        assert_eq!(framer.byte_count(), 0);
        assert_eq!(framer.bit_count(), 0);
        assert_eq!(framer.declared_len(), 0);
        assert_eq!(framer.word() & !PARITY_CARRY_MASK, 0);
    }

    #[test]
    fn test_inverted_preamble() {
        // 29 zero bits then a one: next word is sent with D30* set
        let mut prefix = encode_words(0, &[0, 0, 0]);
        prefix[0] |= 1;
        let data = message(3, 77, 1);
        let words: Vec<u32> = prefix
            .iter()
            .copied()
            .chain(encode_words(0b01, &data))
            .collect();
        let stream = pack_6of8(&words);

        let mut framer = recording_framer();
        let events = feed_all(&mut framer, &stream);
        let messages: Vec<_> = events.iter().filter(|e| e.status().is_some()).collect();
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            messages[0],
            FrameEvent::Message {
                message_type: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_parity_error_resyncs() {
        let first = message(9, 1, 2);
        let second = message(16, 2, 1);
        let mut words = encode_words(0, &first);
        let last = *words.last().unwrap();
        words.extend(encode_words(last, &second));

        // Corrupt a data bit of the third word of the first frame
        words[2] ^= 1 << 20;
        let stream = pack_6of8(&words);

        let mut framer = recording_framer();
        let mut events = feed_all(&mut framer, &stream[..15]);

        // Word 3 completes on the last bit of byte 15
        assert_eq!(events[14], FrameEvent::ParityError);
        assert!(framer.is_hunting());
        assert_eq!(framer.bit_count(), 0);
        assert_eq!(framer.declared_len(), 0);
        assert_eq!(framer.word() & !PARITY_CARRY_MASK, 0);
        // D29*/D30* of the failed word seed the next parity check
        assert_eq!(framer.word(), words[2] & PARITY_CARRY_MASK);

        events.extend(feed_all(&mut framer, &stream[15..]));
        let messages: Vec<u16> = events
            .iter()
            .filter_map(|e| match e {
                FrameEvent::Message { message_type, .. } => Some(*message_type),
                _ => None,
            })
            .collect();
        assert_eq!(messages, vec![16]);
        assert!(framer.is_hunting());
    }

    #[test]
    fn test_frames_off_word_boundary() {
        let messages = [
            message(1, 100, 3),
            message(9, 200, 2),
            message(3, 300, 0),
            message(16, 400, 1),
        ];
        let mut words = Vec::new();
        let mut prev = 0;
        for data in &messages {
            let encoded = encode_words(prev, data);
            prev = *encoded.last().unwrap();
            words.extend(encoded);
        }

        for prefix_bits in 0..60 {
            let stream = pack_after_zeros(prefix_bits, &words);
            let mut delivered = Vec::new();
            let mut framer = Rtcm2Framer::new(|frame: &Frame<'_>| {
                delivered.push(frame.bytes().to_vec());
                DecodeStatus::Corrections
            })
            .unwrap();

            let events = feed_all(&mut framer, &stream);
            let types: Vec<u16> = events
                .iter()
                .filter_map(|e| match e {
                    FrameEvent::Message { message_type, .. } => Some(*message_type),
                    _ => None,
                })
                .collect();
            assert_eq!(types, vec![1, 9, 3, 16], "prefix of {prefix_bits} bits");
            drop(framer);
            assert_eq!(delivered, messages.to_vec());
        }

        // Frames ending mid-byte report on the byte holding their last bit
        let stream = pack_after_zeros(31, &words);
        let mut framer = recording_framer();
        let positions: Vec<usize> = feed_all(&mut framer, &stream)
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_none())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(positions, vec![30, 50, 60, 75]);
    }

    #[test]
    fn test_reset() {
        let data = message(1, 2, 3);
        let stream = pack_6of8(&encode_words(0, &data));
        let mut framer = recording_framer();

        feed_all(&mut framer, &stream[..7]);
        assert!(!framer.is_hunting());

        framer.reset();
        assert!(framer.is_hunting());
        assert_eq!(framer.word(), 0);
        assert_eq!(framer.bit_count(), 0);

        // A fresh frame decodes after the reset
        let events = feed_all(&mut framer, &stream);
        assert!(events.last().unwrap().status().is_some());
    }

    #[test]
    fn test_header_parse() {
        let data = message(31, 1023, 4);
        let header = Rtcm2Header::parse(&data).unwrap();
        assert_eq!(header.message_type, 31);
        assert_eq!(header.station_id, 1023);
        assert_eq!(header.word_count, 4);
        assert!((header.seconds_of_hour() - 740.4).abs() < 1e-9);
        assert!(Rtcm2Header::parse(&data[..5]).is_none());
    }

    #[test]
    fn test_generator_unsupported() {
        let mut generator = Rtcm2Generator::new();
        let mut body = |_: &mut crate::bitwriter::BitWriter<'_>,
                        _: u16,
                        _: bool|
         -> Result<(), FrameError> { Ok(()) };

        let result = generator.generate(&mut body, 1, false);
        assert!(matches!(
            result,
            Err(FrameError::Unsupported(Format::Rtcm2))
        ));
        assert_eq!(generator.byte_count(), 0);
        assert_eq!(generator.declared_len(), 0);
        assert_eq!(generator.bit_count(), 0);
        assert!(generator.frame().is_empty());
    }
}
