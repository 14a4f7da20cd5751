//! DMX Hardware Abstraction Layer
//!
//! This crate defines the hardware-access capability the DMX driver core
//! depends on. Chip-specific HALs implement these traits once per target;
//! the driver never touches register layouts directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  dmx-driver (registry, ISR entries)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  dmx-hal (this crate - traits)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │   dmx-hal-    │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::DmxUart`] - Serial peripheral with break and error reporting
//! - [`gpio::EdgeCapture`] - Edge interrupts on the timing-analysis pin

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::{Edge, EdgeCapture};
pub use uart::{DmxUart, InterruptMask, StopBits, UartConfig};

/// Errors reported by hardware implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// Pin number cannot be routed to this peripheral
    InvalidPin,
    /// Peripheral clock could not be enabled or configured
    Clock,
    /// No interrupt line or handler slot available
    InterruptUnavailable,
    /// Requested baud rate cannot be generated from the peripheral clock
    BaudRate,
}
