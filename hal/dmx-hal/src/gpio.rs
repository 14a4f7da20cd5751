//! GPIO edge capture abstractions
//!
//! The timing analyzer watches an auxiliary pin wired to the receive side
//! of the transceiver. Implementations arm an interrupt on both edges and
//! forward each edge, with its timestamp, to the driver.

use crate::HalError;

/// Signal transition on the capture pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// High to low (start of a break)
    Falling,
    /// Low to high (end of a break, start of mark)
    Rising,
}

impl Edge {
    /// Edge that moves the line away from its current level
    pub fn leaving(high: bool) -> Self {
        if high {
            Edge::Falling
        } else {
            Edge::Rising
        }
    }
}

/// Edge-triggered interrupt source on a GPIO pin
pub trait EdgeCapture {
    /// Arm any-edge interrupts on `pin`
    ///
    /// Calling this while already armed on the same pin is a no-op.
    fn arm(&mut self, pin: u8) -> Result<(), HalError>;

    /// Disarm edge interrupts
    fn disarm(&mut self);

    /// Check if edge interrupts are currently armed
    fn is_armed(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_leaving_level() {
        assert_eq!(Edge::leaving(true), Edge::Falling);
        assert_eq!(Edge::leaving(false), Edge::Rising);
    }
}
