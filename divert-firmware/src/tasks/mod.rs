//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/statics.

pub mod edge;
pub mod log_tx;
pub mod sorter;

pub use edge::edge_task;
pub use log_tx::log_tx_task;
pub use sorter::sorter_task;
