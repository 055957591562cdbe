//! The toggle loop

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use super::config::HeartbeatConfig;
use super::line::LineDriver;
use super::seams::Sleep;

/// Live view of one heartbeat, shared between its task and its handles
#[derive(Debug)]
pub struct HeartbeatStatus {
    running: AtomicBool,
    level: AtomicBool,
    cycles: AtomicU32,
}

impl HeartbeatStatus {
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            level: AtomicBool::new(false),
            cycles: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Level of the current half-cycle
    #[inline]
    pub fn level(&self) -> bool {
        self.level.load(Ordering::Relaxed)
    }

    /// Completed high/low cycles, wrapping
    #[inline]
    pub fn cycles(&self) -> u32 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }
}

impl Default for HeartbeatStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the heartbeat task owns once started
pub(crate) struct Beat<D, S> {
    pub(crate) config: HeartbeatConfig,
    pub(crate) driver: D,
    pub(crate) sleeper: S,
    pub(crate) status: &'static HeartbeatStatus,
}

impl<D: LineDriver, S: Sleep> Beat<D, S> {
    fn half_cycle(&mut self, level: bool) {
        if let Some(line) = self.config.line {
            self.driver.set(line, level);
        }
        self.status.level.store(level, Ordering::Relaxed);
        crate::trace!("heartbeat {=bool}", level);

        let period = if level { self.config.period_high } else { self.config.period_low };
        self.sleeper.sleep(period);
    }

    /// High for `period_high`, then low for `period_low`.
    pub(crate) fn cycle(&mut self) {
        self.half_cycle(true);
        self.half_cycle(false);
        self.status.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn run(&mut self) -> ! {
        loop {
            self.cycle();
        }
    }
}

/// Task entry point; `arg` is the service's `Beat`.
pub(crate) fn beat_entry<D: LineDriver, S: Sleep>(arg: *mut ()) -> ! {
    // SAFETY: `start` passes a pointer into a `'static` service and never
    // touches the `Beat` again.
    let beat = unsafe { &mut *(arg as *mut Beat<D, S>) };
    beat.run()
}
