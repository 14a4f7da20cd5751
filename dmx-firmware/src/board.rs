//! Pin map for the reference board
//!
//! UART1 talks to an RS-485 transceiver. Its receiver output is also
//! wired to a spare GPIO for break and mark-after-break measurement.

/// Registry port served by UART1
pub const DMX_PORT: usize = 0;

/// UART1 TX to transceiver DI
pub const TX_PIN: u8 = 4;
/// UART1 RX from transceiver RO
pub const RX_PIN: u8 = 5;
/// Transceiver DE/RE
pub const ENABLE_PIN: u8 = 6;
/// Copy of RO for edge timing
pub const CAPTURE_PIN: u8 = 7;

/// UART interrupt priority (0 is highest)
pub const DMX_IRQ_PRIORITY: u8 = 1;
