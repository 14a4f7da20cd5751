//! Frame state machine
//!
//! Defines how line events move a port through a packet. Side effects
//! such as buffer writes and event emission live in [`crate::frame`].

pub mod events;
pub mod machine;

pub use events::LineEvent;
pub use machine::{RxState, TxPhase};
