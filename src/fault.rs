//! Fault callback
//!
//! The crate has no fault policy of its own. Firmware may install one
//! callback; the HardFault handler calls it before trapping.

use crate::core::cs_cell::CsCell;
use crate::critical::critical_section;

/// Callback run from the HardFault handler
pub type FaultHook = fn();

static FAULT_HOOK: CsCell<Option<FaultHook>> = CsCell::new(None);

/// Install `hook`, replacing any previous one.
pub fn set_fault_hook(hook: FaultHook) {
    critical_section(|cs| *FAULT_HOOK.get(cs) = Some(hook));
}

/// Currently installed hook
pub fn fault_hook() -> Option<FaultHook> {
    critical_section(|cs| *FAULT_HOOK.get(cs))
}

/// Run the installed hook, if any.
pub(crate) fn run_fault_hook() {
    // Faults preempt everything; nothing else can be touching the cell.
    if let Some(hook) = unsafe { *FAULT_HOOK.get_unchecked() } {
        hook();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    static CALLS: AtomicU32 = AtomicU32::new(0);

    fn count_call() {
        CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_hook_installed_and_run() {
        set_fault_hook(count_call);
        assert!(fault_hook().is_some());

        run_fault_hook();
        run_fault_hook();
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }
}
