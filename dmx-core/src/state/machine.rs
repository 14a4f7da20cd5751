//! State machine definitions
//!
//! Receive behavior is a function of the current state and a line event.
//! Error and timeout outcomes are not states of their own: they complete
//! the packet and drop straight back to [`RxState::WaitBreak`].

use super::events::LineEvent;
use crate::packet::PacketStatus;

/// Receive states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxState {
    /// Discarding slots until the next break
    #[default]
    WaitBreak,
    /// Line is held low
    InBreak,
    /// Mark after break, waiting for the start code
    WaitData,
    /// Storing slots into the active buffer
    ReceivingSlots,
}

impl RxState {
    /// Check if a packet has begun and not yet completed
    pub fn in_packet(&self) -> bool {
        matches!(self, RxState::WaitData | RxState::ReceivingSlots)
    }

    /// Check if `event` marks the start of a new break
    ///
    /// A framing error while idle is how most UARTs see the leading edge
    /// of a break. Repeated break reports within one break are ignored.
    pub fn starts_break(self, event: LineEvent) -> bool {
        match (self, event) {
            (RxState::InBreak, _) => false,
            (_, LineEvent::Break) => true,
            (RxState::WaitBreak, LineEvent::FramingError) => true,
            _ => false,
        }
    }

    /// Status of the packet that `event` completes, if it completes one
    pub fn completion(self, event: LineEvent) -> Option<PacketStatus> {
        use LineEvent::*;
        use RxState::*;

        match (self, event) {
            (ReceivingSlots, Break) => Some(PacketStatus::Ok),
            (WaitData | ReceivingSlots, FramingError) => Some(PacketStatus::FramingError),
            (WaitData | ReceivingSlots, Overrun) => Some(PacketStatus::Overrun),
            (WaitData | ReceivingSlots, IdleTimeout) => Some(PacketStatus::Timeout),
            _ => None,
        }
    }

    /// Process an event and return the next state
    pub fn transition(self, event: LineEvent) -> Self {
        use LineEvent::*;
        use RxState::*;

        match (self, event) {
            // A new break is always honored
            (_, Break) => InBreak,
            (WaitBreak | InBreak, FramingError) => InBreak,

            (InBreak, MarkAfterBreak) => WaitData,

            // Some peripherals never report the mark; the start code implies it
            (InBreak | WaitData | ReceivingSlots, Slot(_)) => ReceivingSlots,

            // Line errors end the packet
            (WaitData | ReceivingSlots, FramingError | Overrun | IdleTimeout) => WaitBreak,

            // Default: stay in current state
            _ => self,
        }
    }
}

/// Transmit phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxPhase {
    /// Nothing in flight
    #[default]
    Idle,
    /// Line held low
    Break,
    /// Line released, waiting out the mark-after-break
    MarkAfterBreak,
    /// Shifting slots into the TX FIFO
    Sending,
    /// All slots queued, waiting for the last stop bit
    Draining,
}

impl TxPhase {
    /// Check if a frame is in flight
    pub fn is_busy(&self) -> bool {
        !matches!(self, TxPhase::Idle)
    }

    /// Advance to the following phase
    pub fn next(self) -> Self {
        match self {
            TxPhase::Idle => TxPhase::Break,
            TxPhase::Break => TxPhase::MarkAfterBreak,
            TxPhase::MarkAfterBreak => TxPhase::Sending,
            TxPhase::Sending => TxPhase::Draining,
            TxPhase::Draining => TxPhase::Idle,
        }
    }
}
