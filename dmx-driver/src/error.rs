//! HAL error mapping

use dmx_core::{ConfigError, DmxError};
use dmx_hal::HalError;

/// Translate a peripheral failure into the driver's error taxonomy
pub fn from_hal(err: HalError) -> DmxError {
    match err {
        HalError::InvalidPin => DmxError::Config(ConfigError::InvalidPin),
        HalError::InterruptUnavailable => DmxError::ResourceExhausted,
        HalError::Clock | HalError::BaudRate => DmxError::HardwareError,
    }
}
