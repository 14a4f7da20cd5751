//! Link monitoring
//!
//! Decides when a line is connected or lost from the consumer side.

pub mod monitor;

pub use monitor::{LinkMonitor, LinkState, LinkTransition, REPORT_INTERVAL_MS};
