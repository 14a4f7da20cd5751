//! Embassy async tasks

pub mod edge;
pub mod monitor;

pub use edge::edge_task;
pub use monitor::monitor_task;
