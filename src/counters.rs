//! Per-type message tallies, owned by the caller and fed from frame events.

use std::fmt;

use crate::frame::{Format, FrameEvent};

/// RTCM 2 slots, indexed by message type.
pub const RTCM2_COUNTER_SLOTS: usize = 100;

/// RTCM 3 slots: slot 0 for unlisted types, then 1000..=1298.
pub const RTCM3_COUNTER_SLOTS: usize = 300;

/// First RTCM 3 message number with its own slot.
const RTCM3_FIRST_TYPE: u16 = 1000;

/// Message counts by type plus integrity error tallies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageCounters {
    rtcm2: [u32; RTCM2_COUNTER_SLOTS],
    rtcm3: [u32; RTCM3_COUNTER_SLOTS],
    parity_errors: u32,
    crc_errors: u32,
}

impl Default for MessageCounters {
    fn default() -> Self {
        Self {
            rtcm2: [0; RTCM2_COUNTER_SLOTS],
            rtcm3: [0; RTCM3_COUNTER_SLOTS],
            parity_errors: 0,
            crc_errors: 0,
        }
    }
}

impl MessageCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot of an RTCM 3 message number.
    fn rtcm3_slot(message_type: u16) -> usize {
        match message_type.checked_sub(RTCM3_FIRST_TYPE) {
            Some(offset) if usize::from(offset) + 1 < RTCM3_COUNTER_SLOTS => {
                usize::from(offset) + 1
            }
            _ => 0,
        }
    }

    /// Tally one event; `NoMessage` is ignored.
    pub fn record(&mut self, event: &FrameEvent) {
        match *event {
            FrameEvent::NoMessage => {}
            FrameEvent::ParityError => self.parity_errors = self.parity_errors.saturating_add(1),
            FrameEvent::CrcError => self.crc_errors = self.crc_errors.saturating_add(1),
            FrameEvent::Message {
                format: Format::Rtcm2,
                message_type,
                ..
            } => {
                if let Some(count) = self.rtcm2.get_mut(usize::from(message_type)) {
                    *count = count.saturating_add(1);
                }
            }
            FrameEvent::Message {
                format: Format::Rtcm3,
                message_type,
                ..
            } => {
                let count = &mut self.rtcm3[Self::rtcm3_slot(message_type)];
                *count = count.saturating_add(1);
            }
        }
    }

    /// Frames seen of an RTCM 2 message type.
    pub fn rtcm2(&self, message_type: u16) -> u32 {
        self.rtcm2
            .get(usize::from(message_type))
            .copied()
            .unwrap_or(0)
    }

    /// Frames seen of an RTCM 3 message number.
    ///
    /// Numbers without their own slot share the "other" count.
    pub fn rtcm3(&self, message_type: u16) -> u32 {
        self.rtcm3[Self::rtcm3_slot(message_type)]
    }

    /// RTCM 3 frames whose number has no slot of its own.
    pub fn rtcm3_other(&self) -> u32 {
        self.rtcm3[0]
    }

    /// Words that failed parity.
    pub fn parity_errors(&self) -> u32 {
        self.parity_errors
    }

    /// Frames that failed CRC.
    pub fn crc_errors(&self) -> u32 {
        self.crc_errors
    }

    /// Total frames delivered to a decoder.
    pub fn total(&self) -> u64 {
        self.rtcm2
            .iter()
            .chain(self.rtcm3.iter())
            .map(|&count| u64::from(count))
            .sum()
    }

    /// Zero every counter.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for MessageCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frames={}", self.total())?;
        for (message_type, &count) in self.rtcm2.iter().enumerate() {
            if count > 0 {
                write!(f, " rtcm2:{message_type}={count}")?;
            }
        }
        for (slot, &count) in self.rtcm3.iter().enumerate().skip(1) {
            if count > 0 {
                write!(
                    f,
                    " rtcm3:{}={count}",
                    usize::from(RTCM3_FIRST_TYPE) + slot - 1
                )?;
            }
        }
        if self.rtcm3[0] > 0 {
            write!(f, " rtcm3:other={}", self.rtcm3[0])?;
        }
        write!(
            f,
            " parity_errors={} crc_errors={}",
            self.parity_errors, self.crc_errors
        )
    }
}
