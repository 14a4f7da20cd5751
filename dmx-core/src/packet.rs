//! Packet events delivered to the consumer
//!
//! One event is produced per completed, failed or timed-out frame.

use embassy_time::Duration;

use crate::config::{RX_MIN_BREAK_US, RX_MIN_MAB_US};

/// Outcome of a received frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketStatus {
    /// Frame ended cleanly at the next break
    Ok,
    /// Stop bit missing on a slot
    FramingError,
    /// Slot arrived before the previous one was consumed
    Overrun,
    /// Line went idle mid-packet, or the break-to-break time was exceeded
    Timeout,
}

impl PacketStatus {
    /// Check if this status indicates an error
    pub fn is_error(&self) -> bool {
        !matches!(self, PacketStatus::Ok)
    }
}

/// Break and mark-after-break lengths measured on the capture pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Time the line was held low
    pub break_len: Duration,
    /// Time from end of break to the start code
    pub mab_len: Duration,
}

impl Timing {
    /// Check the measured lengths against the receive minimums
    pub fn is_compliant(&self) -> bool {
        self.break_len >= Duration::from_micros(RX_MIN_BREAK_US as u64)
            && self.mab_len >= Duration::from_micros(RX_MIN_MAB_US as u64)
    }
}

/// Metadata for one received frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketEvent {
    /// How the frame ended
    pub status: PacketStatus,
    /// Data slots received after the start code
    pub size: usize,
    /// First slot, absent if the frame ended before any slot arrived
    pub start_code: Option<u8>,
    /// Time from the start of the break to completion
    pub duration: Duration,
    /// Measured timing, present only while timing capture is enabled
    pub timing: Option<Timing>,
    /// Slots arrived beyond the buffer capacity and were dropped
    pub truncated: bool,
}

impl PacketEvent {
    /// Bytes stored in the readable buffer, start code included
    pub fn len(&self) -> usize {
        if self.start_code.is_some() {
            self.size + 1
        } else {
            0
        }
    }

    /// Check if no slot was stored
    pub fn is_empty(&self) -> bool {
        self.start_code.is_none()
    }
}
