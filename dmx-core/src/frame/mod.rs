//! Frame processing
//!
//! The receive side turns line events into packet events, filling the
//! double buffer as slots arrive. The transmit side sequences break, mark
//! and slot output and enforces the break-to-break spacing.

pub mod receiver;
pub mod transmitter;

pub use receiver::Receiver;
pub use transmitter::{FillStep, Transmitter};
