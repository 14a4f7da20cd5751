//! Pin routing configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// GPIO routing for a port's transceiver
///
/// A `None` pin keeps whatever routing the peripheral already has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinAssignment {
    /// UART TX (transceiver DI)
    pub tx: Option<u8>,
    /// UART RX (transceiver RO)
    pub rx: Option<u8>,
    /// Transceiver driver-enable (DE/RE)
    pub enable: Option<u8>,
}

impl PinAssignment {
    /// Route all three signals
    pub const fn new(tx: u8, rx: u8, enable: u8) -> Self {
        Self {
            tx: Some(tx),
            rx: Some(rx),
            enable: Some(enable),
        }
    }

    /// Leave all routing untouched
    pub const fn unassigned() -> Self {
        Self {
            tx: None,
            rx: None,
            enable: None,
        }
    }

    /// Check that no two assigned signals share a pin
    pub fn is_distinct(&self) -> bool {
        let pins = [self.tx, self.rx, self.enable];
        for (i, a) in pins.iter().enumerate() {
            for b in &pins[i + 1..] {
                if a.is_some() && a == b {
                    return false;
                }
            }
        }
        true
    }
}
