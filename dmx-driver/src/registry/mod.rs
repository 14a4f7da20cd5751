//! Port registry and hardware context
//!
//! A fixed table of ports, each holding the hardware bound at boot and,
//! while installed, the driver instance that interrupt handlers operate on.
//! Uninstall disarms the interrupt sources, closes the event queue and
//! completion signal, and only then drops the instance.

mod driver;
mod interrupt;
pub mod port;

pub use driver::DmxDriver;
pub use port::{DriverInstance, HardwareContext, Port};
