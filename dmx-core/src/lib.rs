//! Board-agnostic core logic for the DMX512 driver
//!
//! This crate contains all protocol logic that does not depend on
//! specific hardware implementations:
//!
//! - Protocol constants and configuration types
//! - Frame state machine for receive and transmit
//! - Double buffer shared between interrupt and consumer contexts
//! - Edge timing analysis (break and mark-after-break lengths)
//! - Packet event type and error taxonomy
//! - Consumer-side link monitoring

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod frame;
pub mod link;
pub mod packet;
pub mod state;
pub mod timing;

pub use buffer::DoubleBuffer;
pub use config::{DmxConfig, DriverConfig, Mode, PinAssignment};
pub use error::{ConfigError, DmxError};
pub use frame::{FillStep, Receiver, Transmitter};
pub use link::{LinkMonitor, LinkState, LinkTransition};
pub use packet::{PacketEvent, PacketStatus, Timing};
pub use state::{LineEvent, RxState, TxPhase};
pub use timing::EdgeTiming;
