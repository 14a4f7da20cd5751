//! Packet buffers
//!
//! The frame state machine fills one buffer while the consumer reads the
//! other. Roles flip only at packet completion.

pub mod double;

pub use double::DoubleBuffer;
