//! UART abstractions for break-framed serial
//!
//! A DMX port needs more from its UART than plain byte I/O: break
//! detection, framing/overrun flags, an interrupt mask the driver can
//! re-arm from interrupt context, and a way to hold the line low to
//! generate a break.

use core::ops::{BitOr, BitOrAssign};

use crate::HalError;

/// Set of UART interrupt sources
///
/// Used both as an enable mask and as the pending-status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptMask(u16);

impl InterruptMask {
    /// No sources
    pub const NONE: Self = Self(0);
    /// Received data is waiting in the RX FIFO
    pub const RX_DATA: Self = Self(1 << 0);
    /// Break condition detected on RX (line held low past a frame)
    pub const RX_BREAK: Self = Self(1 << 1);
    /// RX line returned to mark after a break
    pub const RX_MARK: Self = Self(1 << 2);
    /// Stop bit missing on a received frame
    pub const RX_FRAMING: Self = Self(1 << 3);
    /// Byte arrived while the RX FIFO was full
    pub const RX_OVERRUN: Self = Self(1 << 4);
    /// Line idle mid-packet longer than the peripheral's timeout
    pub const RX_TIMEOUT: Self = Self(1 << 5);
    /// TX FIFO can accept more data
    pub const TX_READY: Self = Self(1 << 6);
    /// Transmitter shifted out its last stop bit
    pub const TX_DONE: Self = Self(1 << 7);

    /// All receive-side sources
    pub const RX_ALL: Self = Self(0x3F);
    /// All transmit-side sources
    pub const TX_ALL: Self = Self(0xC0);
    /// Every source
    pub const ALL: Self = Self(0xFF);

    /// Raw bit representation
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Build from raw bits, discarding unknown bits
    pub const fn from_bits_truncate(bits: u16) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Check if every source in `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if any source in `other` is set
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Check if no source is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Sources set in both `self` and `other`
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Sources in `self` that are not in `other`
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for InterruptMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for InterruptMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

/// UART line configuration
///
/// Data bits are always eight with no parity on a DMX line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 250_000,
            stop_bits: StopBits::Two,
        }
    }
}

/// UART peripheral driven by the DMX frame state machine
///
/// All methods except [`enable`](Self::enable), [`set_pins`](Self::set_pins)
/// and [`attach_interrupt`](Self::attach_interrupt) are called from interrupt
/// context and must not block.
pub trait DmxUart {
    /// Enable the peripheral clock and apply the line configuration
    ///
    /// Calling it on an enabled peripheral reapplies the configuration.
    fn enable(&mut self, config: &UartConfig) -> Result<(), HalError>;

    /// Disable the peripheral and gate its clock
    fn disable(&mut self);

    /// Route TX, RX and transceiver-enable signals
    ///
    /// `None` leaves the corresponding routing unchanged.
    fn set_pins(
        &mut self,
        tx: Option<u8>,
        rx: Option<u8>,
        enable: Option<u8>,
    ) -> Result<(), HalError>;

    /// Allocate the interrupt line at the given priority and unmask it
    fn attach_interrupt(&mut self, priority: u8) -> Result<(), HalError>;

    /// Mask the interrupt line and release it
    fn detach_interrupt(&mut self);

    /// Arm the given interrupt sources
    fn enable_interrupts(&mut self, mask: InterruptMask);

    /// Disarm the given interrupt sources
    fn disable_interrupts(&mut self, mask: InterruptMask);

    /// Read the pending (armed and raised) interrupt sources
    fn pending_interrupts(&mut self) -> InterruptMask;

    /// Acknowledge the given interrupt sources
    fn clear_interrupts(&mut self, mask: InterruptMask);

    /// Pop one byte from the RX FIFO
    fn read_byte(&mut self) -> Option<u8>;

    /// Push one byte into the TX FIFO
    ///
    /// Returns `false` if the FIFO is full.
    fn write_byte(&mut self, byte: u8) -> bool;

    /// Hold the TX line low (break) or release it to mark
    fn set_break(&mut self, active: bool);

    /// Drive the transceiver direction: `true` to transmit, `false` to receive
    fn set_transmit_enable(&mut self, transmit: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_combination() {
        let mask = InterruptMask::RX_DATA | InterruptMask::RX_BREAK;
        assert!(mask.contains(InterruptMask::RX_DATA));
        assert!(mask.contains(InterruptMask::RX_BREAK));
        assert!(!mask.contains(InterruptMask::TX_READY));
        assert!(mask.intersects(InterruptMask::RX_ALL));
        assert!(!mask.intersects(InterruptMask::TX_ALL));
    }

    #[test]
    fn test_mask_without() {
        let mask = InterruptMask::TX_ALL.without(InterruptMask::TX_READY);
        assert_eq!(mask, InterruptMask::TX_DONE);
        assert!(InterruptMask::NONE.is_empty());
    }

    #[test]
    fn test_rx_and_tx_partition() {
        assert_eq!(InterruptMask::RX_ALL | InterruptMask::TX_ALL, InterruptMask::ALL);
        assert!(!InterruptMask::RX_ALL.intersects(InterruptMask::TX_ALL));
        assert_eq!(InterruptMask::from_bits_truncate(0xFFFF), InterruptMask::ALL);
    }

    #[test]
    fn test_default_config_is_dmx() {
        let config = UartConfig::default();
        assert_eq!(config.baudrate, 250_000);
        assert_eq!(config.stop_bits, StopBits::Two);
    }
}
