//! Frame vocabulary shared by both wire formats.
//!
//! - [`ByteSink`]: anything that consumes a stream one byte at a time
//! - [`Frame`]: borrowed view of a verified frame handed to a decoder
//! - [`MessageDecoder`]: external collaborator interpreting a frame
//! - [`BodyEncoder`]: external collaborator writing a message body
//! - [`FrameEvent`]: what a single input byte produced

#![allow(clippy::cast_possible_truncation)]

use std::fmt;

use crate::bitreader::{get_bits, BitReader};
use crate::bitwriter::BitWriter;
use crate::error::FrameError;
use crate::rtcm2::Rtcm2Header;

/// RTCM wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// RTCM 2: 30-bit parity words carried 6 bits per byte.
    Rtcm2,
    /// RTCM 3: length-prefixed frames protected by CRC-24Q.
    Rtcm3,
}

impl Format {
    /// Header length in bytes, after parity or CRC removal.
    pub const fn header_len(self) -> usize {
        match self {
            Self::Rtcm2 => 6,
            Self::Rtcm3 => 3,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rtcm2 => write!(f, "RTCM 2"),
            Self::Rtcm3 => write!(f, "RTCM 3"),
        }
    }
}

/// Status returned by a [`MessageDecoder`] and passed through to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Error message (-1).
    Error,
    /// Nothing to output (0).
    NoMessage,
    /// Observation data (1).
    Observation,
    /// Ephemeris (2).
    Ephemeris,
    /// Station position / antenna parameters (5).
    StationInfo,
    /// Time parameter (6).
    TimeParameter,
    /// Differential corrections (7).
    Corrections,
    /// Special or vendor message (9).
    Special,
    /// Any other code, carried unmodified.
    Other(i32),
}

impl DecodeStatus {
    /// Map a numeric status code.
    pub fn from_code(code: i32) -> Self {
        match code {
            -1 => Self::Error,
            0 => Self::NoMessage,
            1 => Self::Observation,
            2 => Self::Ephemeris,
            5 => Self::StationInfo,
            6 => Self::TimeParameter,
            7 => Self::Corrections,
            9 => Self::Special,
            other => Self::Other(other),
        }
    }

    /// Numeric status code.
    pub fn code(self) -> i32 {
        match self {
            Self::Error => -1,
            Self::NoMessage => 0,
            Self::Observation => 1,
            Self::Ephemeris => 2,
            Self::StationInfo => 5,
            Self::TimeParameter => 6,
            Self::Corrections => 7,
            Self::Special => 9,
            Self::Other(code) => code,
        }
    }

    /// Negative codes report an error message.
    pub fn is_error(self) -> bool {
        self.code() < 0
    }
}

/// A verified frame, stripped of parity or CRC.
///
/// `bytes()` still includes the header so decoders can address fields by the
/// bit offsets used in the standards; `payload()` is the de-framed body.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    format: Format,
    data: &'a [u8],
    message_type: u16,
    header: Option<Rtcm2Header>,
}

impl<'a> Frame<'a> {
    pub(crate) fn rtcm2(data: &'a [u8], header: Rtcm2Header) -> Self {
        Self {
            format: Format::Rtcm2,
            data,
            message_type: header.message_type,
            header: Some(header),
        }
    }

    pub(crate) fn rtcm3(data: &'a [u8]) -> Self {
        // Message number is the first 12 payload bits
        let message_type = if data.len() >= 5 {
            get_bits(data, 24, 12) as u16
        } else {
            0
        };

        Self {
            format: Format::Rtcm3,
            data,
            message_type,
            header: None,
        }
    }

    /// Wire format of the frame.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Message type (RTCM 2) or message number (RTCM 3).
    pub fn message_type(&self) -> u16 {
        self.message_type
    }

    /// Header and payload bytes.
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Declared frame length in bytes, header included.
    pub fn declared_len(&self) -> usize {
        self.data.len()
    }

    /// De-framed payload.
    pub fn payload(&self) -> &'a [u8] {
        &self.data[self.format.header_len()..]
    }

    /// Parsed two-word header of an RTCM 2 frame.
    pub fn rtcm2_header(&self) -> Option<&Rtcm2Header> {
        self.header.as_ref()
    }

    /// Bit reader over the payload.
    pub fn reader(&self) -> BitReader<'a> {
        BitReader::from_bytes(self.payload())
    }
}

/// Result of feeding one byte to a synchronizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameEvent {
    /// Byte consumed, no frame boundary reached.
    NoMessage,
    /// An RTCM 2 word failed parity; the synchronizer is hunting again.
    ParityError,
    /// An RTCM 3 frame failed its CRC; the synchronizer is hunting again.
    CrcError,
    /// A verified frame went to the decoder.
    Message {
        /// Wire format of the frame.
        format: Format,
        /// Message type from the header.
        message_type: u16,
        /// Status the decoder returned.
        status: DecodeStatus,
    },
}

impl FrameEvent {
    /// True for [`FrameEvent::NoMessage`].
    pub fn is_none(&self) -> bool {
        matches!(self, Self::NoMessage)
    }

    /// True for parity and CRC failures.
    pub fn is_integrity_error(&self) -> bool {
        matches!(self, Self::ParityError | Self::CrcError)
    }

    /// Decoder status, if a frame was delivered.
    pub fn status(&self) -> Option<DecodeStatus> {
        match self {
            Self::Message { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Incremental consumer of a byte stream.
pub trait ByteSink {
    /// Consume one byte in stream order.
    fn feed(&mut self, byte: u8) -> FrameEvent;

    /// Drop any partial frame and start hunting for a preamble.
    fn reset(&mut self);
}

/// Interprets verified frames.
pub trait MessageDecoder {
    /// Decode one frame.
    fn decode(&mut self, frame: &Frame<'_>) -> DecodeStatus;
}

impl<F> MessageDecoder for F
where
    F: FnMut(&Frame<'_>) -> DecodeStatus,
{
    fn decode(&mut self, frame: &Frame<'_>) -> DecodeStatus {
        self(frame)
    }
}

/// Writes a message body for frame generation.
pub trait BodyEncoder {
    /// Append the body of `message_type` at the writer's position.
    ///
    /// The position after the call is the end of the body.
    fn encode(
        &mut self,
        writer: &mut BitWriter<'_>,
        message_type: u16,
        sync: bool,
    ) -> Result<(), FrameError>;
}

impl<F> BodyEncoder for F
where
    F: FnMut(&mut BitWriter<'_>, u16, bool) -> Result<(), FrameError>,
{
    fn encode(
        &mut self,
        writer: &mut BitWriter<'_>,
        message_type: u16,
        sync: bool,
    ) -> Result<(), FrameError> {
        self(writer, message_type, sync)
    }
}

/// Lays a message body into a complete frame.
pub trait FrameGenerator {
    /// Build a frame for `message_type`.
    ///
    /// # Arguments
    /// * `encoder` - Writes the message body
    /// * `message_type` - Message type to generate
    /// * `sync` - Synchronous flag (another message of the same epoch follows)
    ///
    /// # Returns
    /// The frame bytes ready for transmission.
    fn generate<E: BodyEncoder + ?Sized>(
        &mut self,
        encoder: &mut E,
        message_type: u16,
        sync: bool,
    ) -> Result<&[u8], FrameError>;

    /// Bytes of the last generated frame; empty after a failure.
    fn frame(&self) -> &[u8];
}

/// Allocate a zeroed frame buffer, reporting allocation failure.
pub(crate) fn alloc_buffer(len: usize) -> Result<Vec<u8>, FrameError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| FrameError::Allocation { len })?;
    buf.resize(len, 0);
    Ok(buf)
}
