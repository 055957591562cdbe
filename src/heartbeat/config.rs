//! Heartbeat configuration

use core::time::Duration;

use crate::config::{CFG_HEARTBEAT_PERIOD_MS, CFG_PRIO_IDLE, CFG_PRIO_NORMAL};
use crate::error::{OsError, OsResult};
use crate::types::Prio;

use super::line::LineId;

/// What to toggle, how fast, and at which priority
///
/// Copied into the service at start; never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Line to drive. `None` keeps the timing loop but touches no hardware.
    pub line: Option<LineId>,
    /// Time spent high each cycle
    pub period_high: Duration,
    /// Time spent low each cycle
    pub period_low: Duration,
    /// Scheduling priority of the heartbeat task (0 = highest)
    pub prio: Prio,
}

impl HeartbeatConfig {
    pub const fn new(
        line: Option<LineId>,
        period_high: Duration,
        period_low: Duration,
        prio: Prio,
    ) -> Self {
        Self { line, period_high, period_low, prio }
    }

    /// Default timing on `line`
    pub const fn on_line(line: LineId) -> Self {
        let mut config = Self::DEFAULT;
        config.line = Some(line);
        config
    }

    /// No line, 10 s high, 10 s low, normal priority
    pub const DEFAULT: Self = Self::new(
        None,
        Duration::from_millis(CFG_HEARTBEAT_PERIOD_MS),
        Duration::from_millis(CFG_HEARTBEAT_PERIOD_MS),
        CFG_PRIO_NORMAL,
    );

    /// Check the invariants `start` relies on
    ///
    /// # Returns
    /// * `Err(OsError::HeartbeatPeriodInvalid)` - a zero period
    /// * `Err(OsError::PrioInvalid)` - idle level or beyond
    pub fn validate(&self) -> OsResult<()> {
        if self.period_high.is_zero() || self.period_low.is_zero() {
            return Err(OsError::HeartbeatPeriodInvalid);
        }
        if self.prio >= CFG_PRIO_IDLE {
            return Err(OsError::PrioInvalid);
        }
        Ok(())
    }

    /// Length of one full high/low cycle
    pub fn cycle(&self) -> Duration {
        self.period_high.saturating_add(self.period_low)
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
