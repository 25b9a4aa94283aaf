//! RTCM 3 frame synchronization and generation.
//!
//! ```text
//! +----------+----------+----------+-----------------+---------+
//! | preamble | reserved |  length  |     payload     | CRC-24Q |
//! |  0xD3 8  |    6     |    10    |  length bytes   |   24    |
//! +----------+----------+----------+-----------------+---------+
//! ```
//!
//! The CRC covers preamble, reserved bits, length and payload.

#![allow(clippy::cast_possible_truncation)]

use tracing::{debug, trace, warn};

use crate::bitreader::get_bits;
use crate::bitwriter::{set_bits, BitWriter};
use crate::crc::crc24q;
use crate::error::FrameError;
use crate::frame::{
    alloc_buffer, BodyEncoder, ByteSink, Format, Frame, FrameEvent, FrameGenerator,
    MessageDecoder,
};

/// Frame preamble.
pub const RTCM3_PREAMBLE: u8 = 0xD3;

/// Header length: preamble, reserved bits and length field.
pub const RTCM3_HEADER_LEN: usize = 3;

/// CRC-24Q trailer length.
pub const RTCM3_CRC_LEN: usize = 3;

/// Largest payload the 10-bit length field can announce.
pub const RTCM3_MAX_PAYLOAD_LEN: usize = 1023;

/// Frame buffer size, large enough for the longest legal frame.
pub const RTCM3_BUFFER_LEN: usize = 1200;

/// RTCM 3 frame synchronizer.
///
/// Buffers bytes from a `0xD3` preamble until the announced length plus CRC
/// has arrived, then verifies the CRC and hands the frame to `D`.
pub struct Rtcm3Framer<D> {
    /// Raw bytes of the frame in progress.
    buf: Vec<u8>,
    /// Bytes buffered so far; 0 while hunting.
    byte_count: usize,
    /// Header plus payload length; 0 until the header is complete.
    declared_len: usize,
    /// Frame decoder.
    decoder: D,
}

impl<D> Rtcm3Framer<D> {
    /// Number of bytes buffered for the frame in progress.
    pub fn byte_count(&self) -> usize {
        self.byte_count
    }

    /// Declared header plus payload length, or 0 if not yet known.
    pub fn declared_len(&self) -> usize {
        self.declared_len
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
}

impl<D: MessageDecoder> Rtcm3Framer<D> {
    /// Create a framer delivering frames to `decoder`.
    ///
    /// # Returns
    /// The framer, or an error if its frame buffer cannot be allocated.
    pub fn new(decoder: D) -> Result<Self, FrameError> {
        Ok(Self {
            buf: alloc_buffer(RTCM3_BUFFER_LEN)?,
            byte_count: 0,
            declared_len: 0,
            decoder,
        })
    }

    /// Verify the buffered frame of `len` bytes and hand it to the decoder.
    fn deliver(&mut self, len: usize) -> FrameEvent {
        if crc24q(&self.buf[..len]) != get_bits(&self.buf, len * 8, 24) {
            debug!("rtcm3 parity error: len={len}");
            return FrameEvent::CrcError;
        }

        let frame = Frame::rtcm3(&self.buf[..len]);
        let message_type = frame.message_type();
        debug!("rtcm3 frame: type={message_type} len={len}");

        let status = self.decoder.decode(&frame);

        FrameEvent::Message {
            format: Format::Rtcm3,
            message_type,
            status,
        }
    }
}

impl<D: MessageDecoder> ByteSink for Rtcm3Framer<D> {
    fn feed(&mut self, byte: u8) -> FrameEvent {
        trace!("rtcm3 input: data={byte:02x}");

        // Synchronize frame
        if self.byte_count == 0 {
            if byte != RTCM3_PREAMBLE {
                return FrameEvent::NoMessage;
            }
            self.buf[0] = byte;
            self.byte_count = 1;
            return FrameEvent::NoMessage;
        }

        // declared_len + RTCM3_CRC_LEN never exceeds RTCM3_BUFFER_LEN
        self.buf[self.byte_count] = byte;
        self.byte_count += 1;

        if self.byte_count == RTCM3_HEADER_LEN {
            self.declared_len = get_bits(&self.buf, 14, 10) as usize + RTCM3_HEADER_LEN;
        }
        if self.byte_count < RTCM3_HEADER_LEN
            || self.byte_count < self.declared_len + RTCM3_CRC_LEN
        {
            return FrameEvent::NoMessage;
        }

        let len = self.declared_len;
        self.reset();
        self.deliver(len)
    }

    fn reset(&mut self) {
        self.byte_count = 0;
        self.declared_len = 0;
    }
}

/// RTCM 3 frame generator.
///
/// Owns the output buffer; each [`FrameGenerator::generate`] call overwrites
/// the previous frame.
#[derive(Debug)]
pub struct Rtcm3Generator {
    /// Output frame.
    buf: Vec<u8>,
    /// Bit cursor after the body and padding.
    bit_count: usize,
    /// Header plus payload length.
    declared_len: usize,
    /// Total frame length including CRC; 0 when no frame is ready.
    byte_count: usize,
}

impl Rtcm3Generator {
    /// Create a generator.
    ///
    /// # Returns
    /// The generator, or an error if its buffer cannot be allocated.
    pub fn new() -> Result<Self, FrameError> {
        Ok(Self {
            buf: alloc_buffer(RTCM3_BUFFER_LEN)?,
            bit_count: 0,
            declared_len: 0,
            byte_count: 0,
        })
    }

    /// Total length of the last frame, CRC included.
    pub fn byte_count(&self) -> usize {
        self.byte_count
    }

    /// Header plus payload length of the last frame.
    pub fn declared_len(&self) -> usize {
        self.declared_len
    }

    /// Bit cursor after the body of the last frame, padding included.
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    fn reset(&mut self) {
        self.bit_count = 0;
        self.declared_len = 0;
        self.byte_count = 0;
    }

    /// Lay out header, body and CRC; returns the header plus payload length.
    fn build<E: BodyEncoder + ?Sized>(
        &mut self,
        encoder: &mut E,
        message_type: u16,
        sync: bool,
    ) -> Result<usize, FrameError> {
        let mut writer = BitWriter::new(&mut self.buf);

        // Preamble, reserved, placeholder length
        writer.write_bits(u32::from(RTCM3_PREAMBLE), 8)?;
        writer.write_bits(0, 6)?;
        writer.write_bits(0, 10)?;

        encoder.encode(&mut writer, message_type, sync)?;

        // Padding to align 8 bit boundary
        writer.pad_to_byte()?;
        self.bit_count = writer.position();

        let len = self.bit_count / 8;
        let payload_len = len - RTCM3_HEADER_LEN;
        if payload_len > RTCM3_MAX_PAYLOAD_LEN {
            return Err(FrameError::FrameTooLarge {
                len: payload_len,
                max: RTCM3_MAX_PAYLOAD_LEN,
            });
        }

        set_bits(&mut self.buf, 14, 10, payload_len as u32);

        let crc = crc24q(&self.buf[..len]);
        set_bits(&mut self.buf, len * 8, 24, crc);

        Ok(len)
    }
}

impl FrameGenerator for Rtcm3Generator {
    fn generate<E: BodyEncoder + ?Sized>(
        &mut self,
        encoder: &mut E,
        message_type: u16,
        sync: bool,
    ) -> Result<&[u8], FrameError> {
        debug!("gen_rtcm3: type={message_type} sync={sync}");

        self.reset();
        match self.build(encoder, message_type, sync) {
            Ok(len) => {
                self.declared_len = len;
                self.byte_count = len + RTCM3_CRC_LEN;
                Ok(&self.buf[..self.byte_count])
            }
            Err(err) => {
                warn!("generate rtcm3 message failed: type={message_type}: {err}");
                self.reset();
                Err(err)
            }
        }
    }

    fn frame(&self) -> &[u8] {
        &self.buf[..self.byte_count]
    }
}

/// Body encoder copying an already encoded message body.
#[derive(Clone, Copy, Debug)]
pub struct RawBody<'a> {
    payload: &'a [u8],
}

impl<'a> RawBody<'a> {
    /// Wrap pre-encoded payload bytes.
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    /// Message number carried in the first 12 bits, or 0 if too short.
    pub fn message_type(&self) -> u16 {
        if self.payload.len() < 2 {
            return 0;
        }
        get_bits(self.payload, 0, 12) as u16
    }
}

impl BodyEncoder for RawBody<'_> {
    fn encode(
        &mut self,
        writer: &mut BitWriter<'_>,
        _message_type: u16,
        _sync: bool,
    ) -> Result<(), FrameError> {
        writer.write_bytes(self.payload)
    }
}
