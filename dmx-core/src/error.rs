//! Error taxonomy
//!
//! Configuration and installation failures are returned synchronously as
//! [`DmxError`]. Line errors seen in interrupt context never surface here;
//! they travel as the status of a packet event.

/// Invalid configuration parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Port number outside the registry
    InvalidPort,
    /// Pin cannot be used for the requested signal
    InvalidPin,
    /// Buffer capacity is zero or above the maximum packet size
    BufferCapacity,
    /// Event queue capacity is zero or above the compile-time bound
    QueueCapacity,
    /// Baud rate outside the accepted range
    BaudRate,
    /// Break length outside the transmit limits
    BreakLength,
    /// Mark-after-break length outside the transmit limits
    MarkAfterBreak,
}

/// Errors returned by driver operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmxError {
    /// Invalid port, pin or parameter
    Config(ConfigError),
    /// Port already has a driver installed
    AlreadyInstalled,
    /// Port has no driver installed
    NotInstalled,
    /// Interrupt or queue allocation failed
    ResourceExhausted,
    /// Peripheral register or clock failure
    HardwareError,
    /// A frame is already being transmitted
    Busy,
    /// Operation not available in the port's current mode
    WrongMode,
    /// Deadline expired before the operation completed
    Timeout,
    /// Resource was torn down while waiting on it
    Closed,
}

impl From<ConfigError> for DmxError {
    fn from(e: ConfigError) -> Self {
        DmxError::Config(e)
    }
}
