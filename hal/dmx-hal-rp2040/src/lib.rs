//! RP2040 implementation of the DMX hardware traits
//!
//! - [`uart::Rp2040Uart`] drives a PL011 UART through its registers and
//!   implements [`dmx_hal::DmxUart`]
//! - [`gpio::CaptureLine`] implements [`dmx_hal::EdgeCapture`] for the
//!   timing-analysis pin
//! - [`pins`] maps GPIO numbers to UART signals

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod pins;
pub mod uart;

pub use gpio::CaptureLine;
pub use pins::UartId;
pub use uart::Rp2040Uart;
