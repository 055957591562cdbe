//! Task Control Block

use core::ptr::NonNull;

use crate::types::{Prio, StkElement, TaskState, Tick};

/// Task Control Block
///
/// `stk_ptr` must stay the first field: PendSV reads and writes it through
/// the raw TCB pointer.
#[repr(C)]
pub struct Tcb {
    /// Saved stack pointer while switched out
    pub stk_ptr: *mut StkElement,

    /// Task name, shown in kernel trace logs
    pub name: &'static str,

    // Ready list links
    pub next_ptr: Option<NonNull<Tcb>>,
    pub prev_ptr: Option<NonNull<Tcb>>,

    // Tick wheel links
    pub tick_next_ptr: Option<NonNull<Tcb>>,
    pub tick_prev_ptr: Option<NonNull<Tcb>>,
    /// Ticks left before the delay expires
    pub tick_remain: Tick,
    /// Wheel slot the task is parked in
    pub tick_wheel_slot: u8,

    pub prio: Prio,
    pub state: TaskState,

    /// Round-robin slice length and what is left of it
    pub time_quanta: Tick,
    pub time_quanta_ctr: Tick,
}

impl Tcb {
    pub const fn new() -> Self {
        Tcb {
            stk_ptr: core::ptr::null_mut(),
            name: "",
            next_ptr: None,
            prev_ptr: None,
            tick_next_ptr: None,
            tick_prev_ptr: None,
            tick_remain: 0,
            tick_wheel_slot: 0,
            prio: 0,
            state: TaskState::Ready,
            time_quanta: 0,
            time_quanta_ctr: 0,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == TaskState::Ready
    }

    #[inline]
    pub fn is_delayed(&self) -> bool {
        self.state == TaskState::Delayed
    }
}

impl Default for Tcb {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Send for Tcb {}
unsafe impl Sync for Tcb {}
