//! What the heartbeat needs from the rest of the firmware
//!
//! Task creation and sleeping go through these traits so the service can be
//! driven by the kernel in firmware and by threads in host tests.

use core::time::Duration;

use crate::error::OsResult;
use crate::task::{os_task_create_with_arg, OsTaskFn, Tcb};
use crate::time::{os_time_dly, ticks_from_duration};
use crate::types::{Prio, StkElement};

/// Creates named background tasks on static storage
pub trait TaskSpawner {
    /// Start `entry(arg)` as a task named `name` at `prio`, running on
    /// `stack`. The task never returns and is never joined.
    fn spawn(
        &mut self,
        tcb: &'static mut Tcb,
        stack: &'static mut [StkElement],
        name: &'static str,
        entry: OsTaskFn,
        arg: *mut (),
        prio: Prio,
    ) -> OsResult<()>;
}

/// Suspends the calling task
pub trait Sleep {
    /// Block the caller for at least `period`; other tasks keep running.
    fn sleep(&mut self, period: Duration);
}

/// Spawns onto the kernel's ready lists
#[derive(Debug, Default, Clone, Copy)]
pub struct KernelSpawner;

impl TaskSpawner for KernelSpawner {
    fn spawn(
        &mut self,
        tcb: &'static mut Tcb,
        stack: &'static mut [StkElement],
        name: &'static str,
        entry: OsTaskFn,
        arg: *mut (),
        prio: Prio,
    ) -> OsResult<()> {
        os_task_create_with_arg(tcb, stack, name, entry, arg, prio)
    }
}

/// Sleeps on the kernel tick
#[derive(Debug, Default, Clone, Copy)]
pub struct KernelSleep;

impl Sleep for KernelSleep {
    /// Fails only outside a running kernel task. The caller would then spin
    /// without any delay, so debug builds stop right there.
    fn sleep(&mut self, period: Duration) {
        let res = os_time_dly(ticks_from_duration(period));
        if let Err(err) = res {
            crate::error!("kernel sleep failed ({})", err);
        }
        debug_assert!(res.is_ok(), "kernel sleep failed: {:?}", res);
    }
}
