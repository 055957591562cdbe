//! Kernel modules
//!
//! The task runtime the heartbeat runs on: bring-up, scheduling, task
//! creation and tick delays.

pub mod config;
pub mod critical;
pub mod cs_cell;
pub mod error;
pub mod kernel;
pub mod prio;
pub mod sched;
pub mod task;
pub mod time;
pub mod types;
