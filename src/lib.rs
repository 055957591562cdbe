//! Liveness heartbeat for Cortex-M firmware
//!
//! A [`HeartbeatService`] owns one never-ending background task that drives
//! an output line high and low on a fixed duty cycle, so an observer can
//! tell the firmware has not hung. It runs on a small preemptive kernel:
//! - Priority-based preemptive scheduling with round-robin per level
//! - Static task storage, tick-based delays
//! - Context switching for ARM Cortex-M4

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

// ============ Critical Section ============

#[cfg(target_arch = "arm")]
mod cs_impl {
    use cortex_m::interrupt;
    use cortex_m::register::primask;
    use critical_section::{set_impl, Impl, RawRestoreState};

    struct SingleCoreCriticalSection;
    set_impl!(SingleCoreCriticalSection);

    unsafe impl Impl for SingleCoreCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            let was_active = primask::read().is_active();
            interrupt::disable();
            was_active
        }

        unsafe fn release(was_active: RawRestoreState) {
            if was_active {
                unsafe { interrupt::enable() }
            }
        }
    }
}

// ============ Modules ============

pub mod log;
mod lang_items;

pub mod core;
pub mod fault;
pub mod heartbeat;
pub mod port;

// ============ Re-exports ============

pub use core::config;
pub use core::config::*;
pub use core::critical;
pub use core::error;
pub use core::error::{OsError, OsResult};
pub use core::kernel;
pub use core::kernel::{os_init, os_start};
pub use core::prio;
pub use core::sched;
pub use core::task;
pub use core::task::os_task_create;
pub use core::time;
pub use core::types;
pub use core::types::*;

pub use heartbeat::{
    HeartbeatConfig, HeartbeatHandle, HeartbeatRegistry, HeartbeatService, HeartbeatState,
    LineDriver, LineId, Sleep, TaskSpawner,
};

#[cfg(feature = "pac")]
pub use stm32_metapac as pac;
