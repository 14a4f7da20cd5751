//! Transmit sequencing
//!
//! A frame is a break, a mark-after-break, then the staged slots. The
//! driver performs the line operations; this type tracks the phase,
//! decides how long each step lasts and feeds slots to the FIFO.

use embassy_time::{Duration, Instant};

use crate::buffer::DoubleBuffer;
use crate::config::{DmxConfig, TX_MIN_BREAK_TO_BREAK_US};
use crate::error::DmxError;
use crate::state::TxPhase;

/// Outcome of offering one slot to the FIFO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStep {
    /// A slot was queued; more may follow
    Queued,
    /// The FIFO is full, or the frame is not sending yet
    Stalled,
    /// Every slot has been queued
    Complete,
}

/// Transmit state for one port
#[derive(Debug, Clone)]
pub struct Transmitter {
    phase: TxPhase,
    /// Start of the most recent break
    last_break: Option<Instant>,
    break_len: Duration,
    mab_len: Duration,
}

impl Default for Transmitter {
    fn default() -> Self {
        Self::new(&DmxConfig::default())
    }
}

impl Transmitter {
    /// Create an idle transmitter using the break and mark of `config`
    pub fn new(config: &DmxConfig) -> Self {
        Self {
            phase: TxPhase::Idle,
            last_break: None,
            break_len: Duration::from_micros(config.break_len_us as u64),
            mab_len: Duration::from_micros(config.mab_len_us as u64),
        }
    }

    /// Apply new break and mark lengths to the following frames
    pub fn set_timing(&mut self, config: &DmxConfig) {
        self.break_len = Duration::from_micros(config.break_len_us as u64);
        self.mab_len = Duration::from_micros(config.mab_len_us as u64);
    }

    pub fn phase(&self) -> TxPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    /// Configured break length
    pub fn break_len(&self) -> Duration {
        self.break_len
    }

    /// Configured mark-after-break length
    pub fn mab_len(&self) -> Duration {
        self.mab_len
    }

    /// Time still to wait before a break may start at `now`
    pub fn break_delay(&self, now: Instant) -> Duration {
        let min = Duration::from_micros(TX_MIN_BREAK_TO_BREAK_US as u64);
        match self.last_break {
            Some(last) => min
                .checked_sub(now.saturating_duration_since(last))
                .unwrap_or(Duration::from_ticks(0)),
            None => Duration::from_ticks(0),
        }
    }

    /// Start a frame: the caller drives the line low at `now`
    pub fn begin(&mut self, now: Instant) -> Result<(), DmxError> {
        if self.is_busy() {
            return Err(DmxError::Busy);
        }
        self.phase = TxPhase::Break;
        self.last_break = Some(now);
        Ok(())
    }

    /// The caller released the line after the break
    pub fn end_break(&mut self) {
        if self.phase == TxPhase::Break {
            self.phase = TxPhase::MarkAfterBreak;
        }
    }

    /// The mark has elapsed; slots may now be queued
    pub fn end_mark(&mut self) {
        if self.phase == TxPhase::MarkAfterBreak {
            self.phase = TxPhase::Sending;
        }
    }

    /// Push as many slots as `write` accepts
    ///
    /// Returns `true` once every slot has been queued, which moves the
    /// frame into draining.
    pub fn fill<F>(&mut self, buffers: &mut DoubleBuffer, mut write: F) -> bool
    where
        F: FnMut(u8) -> bool,
    {
        loop {
            match self.fill_one(buffers, &mut write) {
                FillStep::Queued => continue,
                FillStep::Stalled => return false,
                FillStep::Complete => return true,
            }
        }
    }

    /// Offer the next slot to `write`
    ///
    /// Queues at most one slot, so the caller can bound the work done per
    /// lock.
    pub fn fill_one<F>(&mut self, buffers: &mut DoubleBuffer, write: F) -> FillStep
    where
        F: FnOnce(u8) -> bool,
    {
        match self.phase {
            TxPhase::Sending => {}
            TxPhase::Draining => return FillStep::Complete,
            _ => return FillStep::Stalled,
        }
        let Some(byte) = buffers.peek_slot() else {
            self.phase = TxPhase::Draining;
            return FillStep::Complete;
        };
        if !write(byte) {
            return FillStep::Stalled;
        }
        buffers.read_slot();
        FillStep::Queued
    }

    /// The last stop bit has left the line
    ///
    /// Returns `true` if a frame was draining.
    pub fn finish(&mut self) -> bool {
        let draining = self.phase == TxPhase::Draining;
        if draining {
            self.phase = TxPhase::Idle;
        }
        draining
    }

    /// Abandon the frame in flight
    pub fn abort(&mut self) {
        self.phase = TxPhase::Idle;
    }
}
