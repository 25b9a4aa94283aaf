//! Error types for RTCM frame synchronization and generation.
//!
//! Recoverable stream conditions (no preamble, parity or CRC failure) are not
//! errors: they are reported as [`FrameEvent`](crate::FrameEvent)s and the
//! synchronizer keeps hunting. `FrameError` covers the failures that end an
//! operation: construction, generation, bounded bit access and I/O.

use thiserror::Error;

use crate::frame::Format;

/// Errors that can occur while building, reading or writing RTCM frames.
#[derive(Error, Debug)]
pub enum FrameError {
    /// Frame buffer could not be allocated at construction time
    #[error("cannot allocate a {len} byte frame buffer")]
    Allocation {
        /// Requested buffer size in bytes
        len: usize,
    },

    /// Generated payload does not fit the 10-bit length field
    #[error("frame too large: {len} payload bytes exceeds maximum {max}")]
    FrameTooLarge {
        /// Payload length after padding
        len: usize,
        /// Largest payload the length field can carry
        max: usize,
    },

    /// A bit write would run past the end of the output buffer
    #[error("buffer overflow: writing {width} bits at bit {pos} exceeds {capacity} bits")]
    BufferOverflow {
        /// Bit offset of the write
        pos: usize,
        /// Width of the field in bits
        width: usize,
        /// Buffer capacity in bits
        capacity: usize,
    },

    /// Not enough bits remain in the frame
    #[error("not enough bits remaining in frame")]
    Underflow,

    /// Field width outside 1..=32
    #[error("invalid bit field width: {0} (must be 1-32)")]
    InvalidWidth(usize),

    /// Frame generation is not available for this format
    #[error("frame generation is not supported for {0}")]
    Unsupported(Format),

    /// The body encoder rejected the message
    #[error("cannot encode message type {message_type}: {reason}")]
    Encode {
        /// Requested message type
        message_type: u16,
        /// Why the body encoder gave up
        reason: String,
    },

    /// Reading from the byte source failed
    #[error("input error: {0}")]
    Io(#[from] std::io::Error),
}
