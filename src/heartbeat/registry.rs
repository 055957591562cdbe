//! Lines with a running heartbeat
//!
//! One registry belongs to the firmware's composition root and is passed to
//! every `start`. It is what turns a second heartbeat on the same line into
//! an error instead of two tasks fighting over one pad.

use crate::config::CFG_HEARTBEAT_MAX;
use crate::core::cs_cell::CsCell;
use crate::critical::critical_section;
use crate::error::{OsError, OsResult};

use super::line::LineId;

/// Fixed-capacity set of claimed lines
pub struct HeartbeatRegistry {
    lines: CsCell<[Option<LineId>; CFG_HEARTBEAT_MAX]>,
}

impl HeartbeatRegistry {
    pub const fn new() -> Self {
        Self { lines: CsCell::new([None; CFG_HEARTBEAT_MAX]) }
    }

    /// Record `line` as driven by a heartbeat.
    ///
    /// # Returns
    /// * `Err(OsError::HeartbeatAlreadyRunning)` - already claimed
    /// * `Err(OsError::HeartbeatRegistryFull)` - no free slot
    pub(crate) fn claim(&self, line: LineId) -> OsResult<()> {
        critical_section(|cs| {
            let lines = self.lines.get(cs);
            if lines.contains(&Some(line)) {
                return Err(OsError::HeartbeatAlreadyRunning);
            }
            let slot = lines
                .iter_mut()
                .find(|slot| slot.is_none())
                .ok_or(OsError::HeartbeatRegistryFull)?;
            *slot = Some(line);
            Ok(())
        })
    }

    /// Undo a claim whose task never started.
    pub(crate) fn release(&self, line: LineId) {
        critical_section(|cs| {
            for slot in self.lines.get(cs).iter_mut() {
                if *slot == Some(line) {
                    *slot = None;
                }
            }
        });
    }

    pub fn is_running(&self, line: LineId) -> bool {
        critical_section(|cs| self.lines.get(cs).contains(&Some(line)))
    }

    /// Number of claimed lines
    pub fn len(&self) -> usize {
        critical_section(|cs| self.lines.get(cs).iter().flatten().count())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HeartbeatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_once_per_line() {
        let registry = HeartbeatRegistry::new();
        let line = LineId::new(0, 5);

        assert!(registry.is_empty());
        assert_eq!(registry.claim(line), Ok(()));
        assert!(registry.is_running(line));
        assert_eq!(registry.claim(line), Err(OsError::HeartbeatAlreadyRunning));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_full_registry() {
        let registry = HeartbeatRegistry::new();
        for pad in 0..CFG_HEARTBEAT_MAX as u8 {
            assert_eq!(registry.claim(LineId::new(1, pad)), Ok(()));
        }
        assert_eq!(
            registry.claim(LineId::new(2, 0)),
            Err(OsError::HeartbeatRegistryFull)
        );
        // Duplicates are still reported as duplicates when full.
        assert_eq!(
            registry.claim(LineId::new(1, 0)),
            Err(OsError::HeartbeatAlreadyRunning)
        );
    }

    #[test]
    fn test_release_frees_slot() {
        let registry = HeartbeatRegistry::new();
        let line = LineId::new(0, 1);

        registry.claim(line).unwrap();
        registry.release(line);
        assert!(!registry.is_running(line));
        assert!(registry.is_empty());
        assert_eq!(registry.claim(line), Ok(()));
    }
}
