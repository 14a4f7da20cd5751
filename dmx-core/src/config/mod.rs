//! Configuration types and protocol constants
//!
//! Timing limits follow the DMX512-A receive and transmit requirements.

mod hardware;
mod types;

pub use hardware::PinAssignment;
pub use types::{DmxConfig, DriverConfig, Mode};

/// Nominal line rate in bits per second
pub const BAUD_RATE: u32 = 250_000;
/// Lowest accepted configured baud rate
pub const MIN_BAUD_RATE: u32 = 245_000;
/// Highest accepted configured baud rate
pub const MAX_BAUD_RATE: u32 = 255_000;

/// Maximum slots in a packet, including the start code
pub const MAX_PACKET_SIZE: usize = 513;

/// Upper bound on events buffered per port
pub const MAX_QUEUE_CAPACITY: usize = 16;

/// Shortest break a receiver must accept (µs)
pub const RX_MIN_BREAK_US: u32 = 88;
/// Shortest mark-after-break a receiver must accept (µs)
pub const RX_MIN_MAB_US: u32 = 8;
/// Longest time between breaks before a packet counts as timed out (ms)
pub const RX_PACKET_TIMEOUT_MS: u32 = 1250;

/// Default transmitted break length (44 bit times)
pub const TX_DEFAULT_BREAK_US: u32 = 176;
/// Default transmitted mark-after-break (3 bit times)
pub const TX_DEFAULT_MAB_US: u32 = 12;
/// Shortest break a transmitter may generate (µs)
pub const TX_MIN_BREAK_US: u32 = 92;
/// Shortest mark-after-break a transmitter may generate (µs)
pub const TX_MIN_MAB_US: u32 = 12;
/// Longest break or mark-after-break a transmitter may generate (µs)
pub const TX_MAX_TIMING_US: u32 = 1_000_000;
/// Shortest time between the starts of two transmitted breaks (µs)
pub const TX_MIN_BREAK_TO_BREAK_US: u32 = 1204;
