//! Core type definitions
//!
//! Strong names for the handful of kernel primitives the runtime uses.

/// Task priority (0 = highest priority)
pub type Prio = u8;

/// Tick counter type
pub type Tick = u32;

/// Nesting counter
pub type NestingCtr = u8;

/// Stack element type
pub type StkElement = u32;

/// Task state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    /// Task is ready to run
    Ready = 0,
    /// Task is waiting on the tick wheel
    Delayed = 1,
}
