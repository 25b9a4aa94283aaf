//! Stream drivers.
//!
//! Feed a synchronizer from a slice or a [`Read`] source, stopping at the
//! first byte that produces an event. [`Receiver`] picks the synchronizer at
//! runtime.

use std::io::Read;

use tracing::trace;

use crate::error::FrameError;
use crate::frame::{ByteSink, Format, FrameEvent, MessageDecoder};
use crate::rtcm2::Rtcm2Framer;
use crate::rtcm3::Rtcm3Framer;

/// Bytes consumed by [`input_reader`] before it yields to the caller.
pub const DEFAULT_CHUNK_LEN: usize = 4096;

/// Outcome of [`input_reader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadStatus {
    /// A byte produced an event, or the chunk ran out (`NoMessage`).
    Event(FrameEvent),
    /// The source is exhausted.
    EndOfStream,
}

/// Synchronizer for a format chosen at runtime.
pub enum Receiver<D> {
    /// RTCM 2 synchronizer.
    Rtcm2(Rtcm2Framer<D>),
    /// RTCM 3 synchronizer.
    Rtcm3(Rtcm3Framer<D>),
}

impl<D: MessageDecoder> Receiver<D> {
    /// Create a synchronizer for `format`.
    ///
    /// # Returns
    /// The receiver, or an error if its frame buffer cannot be allocated.
    pub fn new(format: Format, decoder: D) -> Result<Self, FrameError> {
        Ok(match format {
            Format::Rtcm2 => Self::Rtcm2(Rtcm2Framer::new(decoder)?),
            Format::Rtcm3 => Self::Rtcm3(Rtcm3Framer::new(decoder)?),
        })
    }
}

impl<D> Receiver<D> {
    /// Wire format being synchronized.
    pub fn format(&self) -> Format {
        match self {
            Self::Rtcm2(_) => Format::Rtcm2,
            Self::Rtcm3(_) => Format::Rtcm3,
        }
    }

    /// Number of bytes buffered for the frame in progress.
    pub fn byte_count(&self) -> usize {
        match self {
            Self::Rtcm2(framer) => framer.byte_count(),
            Self::Rtcm3(framer) => framer.byte_count(),
        }
    }

    /// Declared length of the frame in progress, or 0 if not yet known.
    pub fn declared_len(&self) -> usize {
        match self {
            Self::Rtcm2(framer) => framer.declared_len(),
            Self::Rtcm3(framer) => framer.declared_len(),
        }
    }

    /// Shared access to the decoder.
    pub fn decoder(&self) -> &D {
        match self {
            Self::Rtcm2(framer) => framer.decoder(),
            Self::Rtcm3(framer) => framer.decoder(),
        }
    }

    /// Mutable access to the decoder.
    pub fn decoder_mut(&mut self) -> &mut D {
        match self {
            Self::Rtcm2(framer) => framer.decoder_mut(),
            Self::Rtcm3(framer) => framer.decoder_mut(),
        }
    }

    /// Consume the receiver, returning the decoder.
    pub fn into_decoder(self) -> D {
        match self {
            Self::Rtcm2(framer) => framer.into_decoder(),
            Self::Rtcm3(framer) => framer.into_decoder(),
        }
    }
}

impl<D: MessageDecoder> ByteSink for Receiver<D> {
    fn feed(&mut self, byte: u8) -> FrameEvent {
        match self {
            Self::Rtcm2(framer) => framer.feed(byte),
            Self::Rtcm3(framer) => framer.feed(byte),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Rtcm2(framer) => framer.reset(),
            Self::Rtcm3(framer) => framer.reset(),
        }
    }
}

/// Feed bytes until one of them produces an event.
///
/// # Arguments
/// * `sink` - Synchronizer to feed
/// * `data` - Input bytes in stream order
///
/// # Returns
/// The number of bytes consumed and the event of the last one. If no byte
/// produced an event, all of `data` is consumed and the event is `NoMessage`.
pub fn input_slice<S: ByteSink + ?Sized>(sink: &mut S, data: &[u8]) -> (usize, FrameEvent) {
    for (i, &byte) in data.iter().enumerate() {
        let event = sink.feed(byte);
        if !event.is_none() {
            return (i + 1, event);
        }
    }
    (data.len(), FrameEvent::NoMessage)
}

/// Feed bytes from `reader` until one produces an event.
///
/// Reads one byte at a time, so nothing past the event is consumed; wrap
/// unbuffered sources in a [`std::io::BufReader`].
///
/// # Arguments
/// * `sink` - Synchronizer to feed
/// * `reader` - Byte source
/// * `chunk_len` - Bytes to consume before returning `NoMessage`; 0 reads
///   until an event or the end of the source
///
/// # Returns
/// `EndOfStream` once the source is exhausted, otherwise the event.
pub fn input_reader<S, R>(
    sink: &mut S,
    reader: &mut R,
    chunk_len: usize,
) -> Result<ReadStatus, FrameError>
where
    S: ByteSink + ?Sized,
    R: Read + ?Sized,
{
    let mut count = 0;
    for byte in reader.bytes() {
        let event = sink.feed(byte?);
        if !event.is_none() {
            return Ok(ReadStatus::Event(event));
        }

        count += 1;
        if chunk_len != 0 && count >= chunk_len {
            trace!("input chunk done: bytes={count}");
            return Ok(ReadStatus::Event(FrameEvent::NoMessage));
        }
    }
    Ok(ReadStatus::EndOfStream)
}
