//! Edge timing capture
//!
//! Slot data toggles the capture pin too, so a falling edge alone cannot
//! open a break. The frame state machine opens it when the UART reports
//! the break; the falling edge that preceded that report is the break
//! start. The next rising edge closes the break, and the falling edge of
//! the start code's start bit closes the mark-after-break.

use embassy_time::{Duration, Instant};

use crate::packet::Timing;

/// Break and mark-after-break measurement state for one port
#[derive(Debug, Clone, Default)]
pub struct EdgeTiming {
    /// Line is low inside a reported break
    in_break: bool,
    /// Timestamp of the most recent falling edge
    last_falling: Option<Instant>,
    /// Timestamp of the most recent rising edge
    last_rising: Option<Instant>,
    /// Length of the current packet's break
    break_len: Option<Duration>,
    /// Length of the current packet's mark-after-break
    mab_len: Option<Duration>,
}

impl EdgeTiming {
    /// Create a capture with nothing measured
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a reported break has not yet seen its rising edge
    pub fn in_break(&self) -> bool {
        self.in_break
    }

    /// Length of the current packet's break, once closed
    pub fn break_len(&self) -> Option<Duration> {
        self.break_len
    }

    /// Length of the current packet's mark-after-break, once closed
    pub fn mab_len(&self) -> Option<Duration> {
        self.mab_len
    }

    /// The UART reported a break: start measuring a new packet
    pub fn on_break(&mut self) {
        self.in_break = true;
        self.break_len = None;
        self.mab_len = None;
    }

    /// Record a falling edge
    pub fn on_falling_edge(&mut self, now: Instant) {
        if !self.in_break && self.break_len.is_some() && self.mab_len.is_none() {
            if let Some(rising) = self.last_rising {
                self.mab_len = Some(now.saturating_duration_since(rising));
            }
        }
        self.last_falling = Some(now);
    }

    /// Record a rising edge
    pub fn on_rising_edge(&mut self, now: Instant) {
        if self.in_break {
            if let Some(falling) = self.last_falling {
                self.break_len = Some(now.saturating_duration_since(falling));
                self.in_break = false;
            }
        }
        self.last_rising = Some(now);
    }

    /// Finish the measurement when the start code arrives
    ///
    /// If the start bit's falling edge was missed, the mark is taken up to
    /// `now`. Returns `None` unless the break was closed by a rising edge.
    pub fn on_start_code(&mut self, now: Instant) -> Option<Timing> {
        let break_len = self.break_len?;
        let mab_len = match self.mab_len {
            Some(mab) => mab,
            None => {
                let mab = now.saturating_duration_since(self.last_rising?);
                self.mab_len = Some(mab);
                mab
            }
        };
        Some(Timing { break_len, mab_len })
    }
}
