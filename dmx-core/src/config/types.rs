//! Line and installation configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{
    BAUD_RATE, MAX_BAUD_RATE, MAX_PACKET_SIZE, MAX_QUEUE_CAPACITY, MIN_BAUD_RATE,
    TX_DEFAULT_BREAK_US, TX_DEFAULT_MAB_US, TX_MAX_TIMING_US, TX_MIN_BREAK_US, TX_MIN_MAB_US,
};
use crate::error::ConfigError;

/// Direction a port is operating in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    /// Listening for packets
    #[default]
    Receive,
    /// Generating packets
    Transmit,
}

/// Line configuration for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DmxConfig {
    /// Baud rate in bits per second
    pub baud_rate: u32,
    /// Transmitted break length in microseconds
    pub break_len_us: u32,
    /// Transmitted mark-after-break length in microseconds
    pub mab_len_us: u32,
}

impl Default for DmxConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DmxConfig {
    /// Standard DMX line: 250 kbit/s, 176 µs break, 12 µs mark
    pub const fn new() -> Self {
        Self {
            baud_rate: BAUD_RATE,
            break_len_us: TX_DEFAULT_BREAK_US,
            mab_len_us: TX_DEFAULT_MAB_US,
        }
    }

    /// Check every field against the protocol limits
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BAUD_RATE..=MAX_BAUD_RATE).contains(&self.baud_rate) {
            return Err(ConfigError::BaudRate);
        }
        if !(TX_MIN_BREAK_US..=TX_MAX_TIMING_US).contains(&self.break_len_us) {
            return Err(ConfigError::BreakLength);
        }
        if !(TX_MIN_MAB_US..=TX_MAX_TIMING_US).contains(&self.mab_len_us) {
            return Err(ConfigError::MarkAfterBreak);
        }
        Ok(())
    }
}

/// Parameters fixed when a port is installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverConfig {
    /// Slots per buffer, including the start code (1-513)
    pub buffer_capacity: usize,
    /// Events held for the consumer before new ones are dropped
    pub queue_capacity: usize,
    /// Interrupt priority passed to the HAL
    pub isr_priority: u8,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: MAX_PACKET_SIZE,
            queue_capacity: 1,
            isr_priority: 1,
        }
    }
}

impl DriverConfig {
    /// Check capacities against the compile-time bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 || self.buffer_capacity > MAX_PACKET_SIZE {
            return Err(ConfigError::BufferCapacity);
        }
        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(ConfigError::QueueCapacity);
        }
        Ok(())
    }
}
