//! # rtcmframe
//!
//! Streaming frame synchronizer and generator for the RTCM differential GNSS
//! correction protocol, in both of its wire formats:
//!
//! - **RTCM 2**: GPS-style 30-bit parity words, carried six bits per byte
//! - **RTCM 3**: length-prefixed frames protected by CRC-24Q
//!
//! Bytes go in one at a time; verified frames come out to a caller-supplied
//! decoder. Partial or corrupt input never reaches the decoder: a parity or
//! CRC failure drops the frame and the synchronizer hunts for the next
//! preamble.
//!
//! ## Design
//!
//! - **Safe Rust** - `#![forbid(unsafe_code)]`
//! - **One state object per stream** - no shared or global state
//! - **Collaborators as traits** - [`MessageDecoder`] and [`BodyEncoder`],
//!   implemented for closures
//!
//! ## API Overview
//!
//! ### Synchronizers
//!
//! - [`Rtcm2Framer`] / [`Rtcm3Framer`] - Per-format [`ByteSink`]s
//! - [`Receiver`] - Format chosen at runtime
//! - [`input_slice`] / [`input_reader`] - Feed until the next event
//!
//! ### Generators
//!
//! - [`Rtcm3Generator`] - Header, body, padding and CRC-24Q
//! - [`Rtcm2Generator`] - Always [`FrameError::Unsupported`]
//! - [`RawBody`] - Copies a pre-encoded message body
//!
//! ### Low-Level Components
//!
//! - [`get_bits`] / [`set_bits`] - Bit fields at arbitrary offsets
//! - [`BitReader`] / [`BitWriter`] - Sequential, bounds-checked access
//! - [`crc24q`] - RTCM 3 checksum
//! - [`decode_word`] / [`encode_word`] - RTCM 2 word parity
//! - [`MessageCounters`] - Per-type tallies fed from [`FrameEvent`]s
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rtcmframe::{input_slice, DecodeStatus, Frame, FrameEvent, Rtcm3Framer};
//!
//! let mut framer = Rtcm3Framer::new(|frame: &Frame<'_>| {
//!     println!("message {} ({} bytes)", frame.message_type(), frame.payload().len());
//!     DecodeStatus::Observation
//! })?;
//!
//! let mut data: &[u8] = &received;
//! while !data.is_empty() {
//!     let (used, event) = input_slice(&mut framer, data);
//!     if let FrameEvent::CrcError = event {
//!         eprintln!("dropped corrupt frame");
//!     }
//!     data = &data[used..];
//! }
//! ```
//!
//! ## References
//!
//! - RTCM 10402.3, Recommended Standards for Differential GNSS Service, v2.3
//! - RTCM 10403.3, Differential GNSS Services, v3

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod bitreader;
mod bitwriter;
mod counters;
mod crc;
mod error;
mod frame;
mod parity;
mod rtcm2;
mod rtcm3;
mod stream;

pub use bitreader::{get_bits, get_bits_signed, BitReader};
pub use bitwriter::{set_bits, BitWriter};
pub use counters::{MessageCounters, RTCM2_COUNTER_SLOTS, RTCM3_COUNTER_SLOTS};
pub use crc::{crc24q, CRC24Q_POLY};
pub use error::FrameError;
pub use frame::{
    BodyEncoder, ByteSink, DecodeStatus, Format, Frame, FrameEvent, FrameGenerator,
    MessageDecoder,
};
pub use parity::{decode_word, encode_word};
pub use rtcm2::{
    Rtcm2Framer, Rtcm2Generator, Rtcm2Header, PARITY_CARRY_MASK, RTCM2_MAX_FRAME_LEN,
    RTCM2_PREAMBLE,
};
pub use rtcm3::{
    RawBody, Rtcm3Framer, Rtcm3Generator, RTCM3_BUFFER_LEN, RTCM3_CRC_LEN, RTCM3_HEADER_LEN,
    RTCM3_MAX_PAYLOAD_LEN, RTCM3_PREAMBLE,
};
pub use stream::{input_reader, input_slice, ReadStatus, Receiver, DEFAULT_CHUNK_LEN};
