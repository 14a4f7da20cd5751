//! Interrupt-driven DMX512 driver
//!
//! Binds the board-agnostic frame logic in `dmx-core` to peripherals that
//! implement the `dmx-hal` traits:
//!
//! ```text
//! UART / GPIO interrupt
//!        │
//!        ▼
//! DmxDriver::on_uart_interrupt ──► Receiver ──► DoubleBuffer (swap)
//!        │                                         │
//!        ▼                                         ▼
//! CompletionSignal (transmit)           EventQueue ──► EventReceiver
//! ```
//!
//! The driver is generic over the raw mutex guarding each port, so the same
//! code runs under `CriticalSectionRawMutex` on target and in host tests.

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod error;
pub mod event;
pub mod registry;

pub use event::{CompletionSignal, EventQueue, EventReceiver};
pub use registry::DmxDriver;

pub use dmx_core::{
    DmxConfig, DmxError, DriverConfig, Mode, PacketEvent, PacketStatus, PinAssignment, Timing,
};
