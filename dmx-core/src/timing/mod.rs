//! Edge timing analysis
//!
//! Break and mark-after-break lengths measured independently of the UART
//! from edges on an auxiliary pin that follows the line.

pub mod capture;

pub use capture::EdgeTiming;
