//! Scheduler
//!
//! Fixed-priority preemptive scheduling with round-robin between tasks that
//! share a priority.

mod rdy_list;

pub use rdy_list::ReadyList;

use core::ptr::NonNull;

use crate::config::CFG_SCHED_ROUND_ROBIN_EN;
use crate::critical::{is_isr_context, CriticalSection};
use crate::kernel;
use crate::task::Tcb;

/// Switch to the highest-priority ready task if it is not the current one.
///
/// Called after anything that changes readiness at task level. From ISRs
/// the switch is deferred to `os_int_exit`.
pub fn os_sched() {
    if !kernel::KERNEL.is_running() || is_isr_context() {
        return;
    }

    let _cs = CriticalSection::enter();

    unsafe {
        let sched = kernel::sched();
        let high_prio = sched.prio_map.highest();
        if let Some(high_rdy) = sched.rdy_list[high_prio as usize].head() {
            kernel::set_high_rdy(high_prio, high_rdy);
            if Some(high_rdy) != kernel::tcb_cur_ptr() {
                crate::port::os_ctx_sw();
            }
        }
    }
}

/// Charge one tick to the running task's slice and rotate when it runs out.
///
/// Must be called with interrupts masked, from the tick handler.
pub(crate) fn os_sched_round_robin() {
    if !CFG_SCHED_ROUND_ROBIN_EN {
        return;
    }

    unsafe {
        let Some(cur_ptr) = kernel::tcb_cur_ptr() else {
            return;
        };
        let cur = &mut *cur_ptr.as_ptr();
        if !cur.is_ready() {
            return;
        }

        cur.time_quanta_ctr = cur.time_quanta_ctr.saturating_sub(1);
        if cur.time_quanta_ctr > 0 {
            return;
        }
        cur.time_quanta_ctr = cur.time_quanta;

        let prio = cur.prio;
        let list = &mut kernel::sched().rdy_list[prio as usize];
        if list.head() != list.tail() {
            list.remove(cur_ptr);
            list.insert_tail(cur_ptr);
            if let Some(next) = list.head() {
                kernel::set_high_rdy(prio, next);
                crate::trace!("slice over: {=str} -> {=str}", cur.name, next.as_ref().name);
            }
            crate::port::os_int_ctx_sw();
        }
    }
}

/// Mark a task ready.
///
/// # Safety
/// Interrupts masked; `tcb` valid and in no ready list.
pub(crate) unsafe fn os_rdy_list_insert(tcb: NonNull<Tcb>) {
    let prio = unsafe { tcb.as_ref() }.prio;
    let sched = unsafe { kernel::sched() };
    unsafe { sched.rdy_list[prio as usize].insert_tail(tcb) };
    sched.prio_map.set(prio);
}

/// Take a task off its ready list.
///
/// # Safety
/// Interrupts masked; `tcb` valid and linked into its priority's list.
pub(crate) unsafe fn os_rdy_list_remove(tcb: NonNull<Tcb>) {
    let prio = unsafe { tcb.as_ref() }.prio;
    let sched = unsafe { kernel::sched() };
    let list = &mut sched.rdy_list[prio as usize];
    unsafe { list.remove(tcb) };
    if list.is_empty() {
        sched.prio_map.clear(prio);
    }
}
