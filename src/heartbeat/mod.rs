//! Heartbeat service
//!
//! Signals liveness by driving a line high and low forever from its own
//! task. Started once per line; there is no way to stop it, the same as
//! the firmware it runs in.
//!
//! ```ignore
//! static REGISTRY: HeartbeatRegistry = HeartbeatRegistry::new();
//! static mut HEARTBEAT: HeartbeatService<PacLines, KernelSleep> = HeartbeatService::new();
//!
//! let config = HeartbeatConfig::on_line(LineId::new(0, 5));
//! let handle = unsafe { &mut HEARTBEAT }
//!     .start(&REGISTRY, &mut KernelSpawner, config, PacLines, KernelSleep)?;
//! ```

mod beat;
mod config;
mod line;
mod registry;
mod seams;

pub use beat::HeartbeatStatus;
pub use config::HeartbeatConfig;
pub use line::{LineDriver, LineId, NoLines};
#[cfg(feature = "pac")]
pub use line::PacLines;
pub use registry::HeartbeatRegistry;
pub use seams::{KernelSleep, KernelSpawner, Sleep, TaskSpawner};

use crate::config::CFG_HEARTBEAT_STK_SIZE;
use crate::error::OsResult;
use crate::task::{OsTaskFn, Tcb};
use crate::types::{Prio, StkElement};

use beat::{beat_entry, Beat};

/// Lifecycle of a heartbeat; `Running` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeartbeatState {
    Idle,
    Running,
}

/// Static storage for one heartbeat task
///
/// Holds the task's control block and stack, so the task's whole execution
/// context is allocated with the image and never grows or moves.
pub struct HeartbeatService<D, S> {
    tcb: Tcb,
    stack: [StkElement; CFG_HEARTBEAT_STK_SIZE],
    beat: Option<Beat<D, S>>,
    status: HeartbeatStatus,
}

impl<D, S> HeartbeatService<D, S> {
    pub const fn new() -> Self {
        Self {
            tcb: Tcb::new(),
            stack: [0; CFG_HEARTBEAT_STK_SIZE],
            beat: None,
            status: HeartbeatStatus::new(),
        }
    }

    pub fn state(&self) -> HeartbeatState {
        if self.status.is_running() {
            HeartbeatState::Running
        } else {
            HeartbeatState::Idle
        }
    }
}

impl<D: LineDriver + 'static, S: Sleep + 'static> HeartbeatService<D, S> {
    /// Start the heartbeat task
    ///
    /// Takes the service for good: its storage now belongs to the task.
    ///
    /// # Arguments
    /// * `registry` - lines already driven by a heartbeat
    /// * `spawner` - creates the background task
    /// * `config` - copied; the task never sees later changes
    /// * `driver` - sets the configured line
    /// * `sleeper` - suspends the task between edges
    ///
    /// # Returns
    /// * `Err(OsError::HeartbeatAlreadyRunning)` - `config.line` already has
    ///   a heartbeat; the running one is untouched
    /// * `Err(OsError::HeartbeatPeriodInvalid)` - a zero period
    /// * `Err(OsError::HeartbeatRegistryFull)` - no room for another line
    /// * any error from `spawner`; the line is released and the driver and
    ///   sleeper are dropped, but the storage stays taken
    pub fn start<T: TaskSpawner>(
        &'static mut self,
        registry: &HeartbeatRegistry,
        spawner: &mut T,
        config: HeartbeatConfig,
        driver: D,
        sleeper: S,
    ) -> OsResult<HeartbeatHandle> {
        config.validate()?;

        if let Some(line) = config.line {
            if let Err(err) = registry.claim(line) {
                crate::warn!("heartbeat: line {=u16} rejected ({})", line.raw(), err);
                return Err(err);
            }
        }

        let HeartbeatService { tcb, stack, beat: slot, status } = self;
        let status: &'static HeartbeatStatus = status;
        let beat = slot.insert(Beat { config, driver, sleeper, status });

        let entry: OsTaskFn = beat_entry::<D, S>;
        let arg = beat as *mut Beat<D, S> as *mut ();

        // The task may run before `spawn` returns; it must already see
        // itself as running.
        status.set_running(true);
        if let Err(err) = spawner.spawn(tcb, stack, "heartbeat", entry, arg, config.prio) {
            status.set_running(false);
            *slot = None;
            if let Some(line) = config.line {
                registry.release(line);
            }
            crate::error!("heartbeat: spawn failed ({})", err);
            return Err(err);
        }

        crate::info!("heartbeat: started at prio {=u8}", config.prio);
        Ok(HeartbeatHandle { status, line: config.line, prio: config.prio })
    }
}

impl<D, S> Default for HeartbeatService<D, S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Introspection for a started heartbeat; there is no stop.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatHandle {
    status: &'static HeartbeatStatus,
    line: Option<LineId>,
    prio: Prio,
}

impl HeartbeatHandle {
    pub fn state(&self) -> HeartbeatState {
        if self.status.is_running() {
            HeartbeatState::Running
        } else {
            HeartbeatState::Idle
        }
    }

    pub fn line(&self) -> Option<LineId> {
        self.line
    }

    pub fn prio(&self) -> Prio {
        self.prio
    }

    /// Completed high/low cycles
    pub fn cycles(&self) -> u32 {
        self.status.cycles()
    }

    /// Level of the half-cycle in progress
    pub fn level(&self) -> bool {
        self.status.level()
    }
}
