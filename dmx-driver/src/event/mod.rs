//! Event publishing
//!
//! Packet events flow from interrupt context to the consumer through a
//! bounded queue; transmit completion flows through a single-slot signal.

pub mod queue;
pub mod signal;

pub use queue::{EventQueue, EventReceiver};
pub use signal::CompletionSignal;
