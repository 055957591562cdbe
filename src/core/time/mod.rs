//! Time management
//!
//! Tick handling and task delays. Delayed tasks sit on a tick wheel keyed by
//! expiry tick; each tick only walks one wheel slot.

use core::time::Duration;

use crate::config::{CFG_TICK_RATE_HZ, CFG_TICK_WHEEL_SIZE};
use crate::critical::{critical_section, is_isr_context};
use crate::error::{OsError, OsResult};
use crate::kernel;
use crate::sched;
use crate::types::{TaskState, Tick};

/// Convert a duration to kernel ticks
///
/// Rounds up so a task never wakes before the requested time, and never
/// returns zero for a non-zero duration. Saturates at `Tick::MAX`.
pub fn ticks_from_duration(d: Duration) -> Tick {
    if d.is_zero() {
        return 0;
    }
    let ticks = d
        .as_nanos()
        .saturating_mul(CFG_TICK_RATE_HZ as u128)
        .div_ceil(1_000_000_000);
    Tick::try_from(ticks).unwrap_or(Tick::MAX).max(1)
}

/// Delay the calling task by `ticks` system ticks
///
/// The task leaves the ready list and the scheduler runs something else
/// until the tick handler wakes it. Zero returns immediately.
///
/// # Returns
/// * `Err(OsError::OsNotRunning)` - kernel not started
/// * `Err(OsError::TimeDlyIsr)` - called from an ISR
pub fn os_time_dly(ticks: Tick) -> OsResult<()> {
    if !kernel::KERNEL.is_running() {
        return Err(OsError::OsNotRunning);
    }
    if is_isr_context() {
        return Err(OsError::TimeDlyIsr);
    }
    if ticks == 0 {
        return Ok(());
    }

    critical_section(|_cs| unsafe {
        if let Some(cur) = kernel::tcb_cur_ptr() {
            let tcb = &mut *cur.as_ptr();
            tcb.tick_remain = ticks;
            tcb.state = TaskState::Delayed;

            let expiry = kernel::KERNEL.tick_get().wrapping_add(ticks);
            kernel::sched().tick_wheel_insert(cur, expiry);
            sched::os_rdy_list_remove(cur);
            crate::trace!("{=str} delayed until tick {=u32}", tcb.name, expiry);
        }
    });

    sched::os_sched();
    Ok(())
}

/// Delay the calling task by at least `ms` milliseconds
pub fn os_time_dly_ms(ms: u32) -> OsResult<()> {
    os_time_dly(ticks_from_duration(Duration::from_millis(ms as u64)))
}

/// Ticks since the kernel started
#[inline]
pub fn os_time_get() -> Tick {
    kernel::KERNEL.tick_get()
}

/// Tick handler, called from SysTick
pub fn os_tick_handler() {
    if !kernel::KERNEL.is_running() {
        return;
    }

    kernel::KERNEL.int_enter();
    let tick = kernel::KERNEL.tick_increment();

    critical_section(|_cs| {
        unsafe { wake_expired(tick) };
        sched::os_sched_round_robin();
    });

    kernel::os_int_exit();
}

/// Walk the wheel slot for `tick` and ready every task due this rotation.
///
/// # Safety
/// Interrupts masked.
unsafe fn wake_expired(tick: Tick) {
    let sched_state = unsafe { kernel::sched() };
    let mut current = sched_state.tick_wheel_head(tick);

    while let Some(tcb_ptr) = current {
        let tcb = unsafe { &mut *tcb_ptr.as_ptr() };
        current = tcb.tick_next_ptr;

        if tcb.tick_remain <= CFG_TICK_WHEEL_SIZE as Tick {
            unsafe { sched_state.tick_wheel_remove(tcb_ptr) };
            tcb.tick_remain = 0;
            if tcb.is_delayed() {
                tcb.state = TaskState::Ready;
                unsafe { sched::os_rdy_list_insert(tcb_ptr) };
                crate::trace!("{=str} woke at tick {=u32}", tcb.name, tick);
            }
        } else {
            tcb.tick_remain -= CFG_TICK_WHEEL_SIZE as Tick;
        }
    }
}

/// SysTick interrupt handler
#[cfg(target_arch = "arm")]
#[no_mangle]
pub extern "C" fn SysTick() {
    os_tick_handler();
}
