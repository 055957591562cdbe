//! Critical sections
//!
//! Interrupt masking for kernel and registry state shared with ISRs.

/// RAII guard for critical sections
///
/// Interrupts are disabled while the guard lives and re-enabled on drop.
pub struct CriticalSection {
    _private: (),
}

impl CriticalSection {
    /// Disable interrupts and return the guard.
    #[inline(always)]
    pub fn enter() -> Self {
        #[cfg(target_arch = "arm")]
        cortex_m::interrupt::disable();

        CriticalSection { _private: () }
    }
}

impl Drop for CriticalSection {
    #[inline(always)]
    fn drop(&mut self) {
        #[cfg(target_arch = "arm")]
        unsafe { cortex_m::interrupt::enable() };
    }
}

/// Run `f` with interrupts disabled
///
/// The guard passed to `f` unlocks [`CsCell`](crate::core::cs_cell::CsCell)
/// contents.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&CriticalSection) -> R,
{
    let cs = CriticalSection::enter();
    f(&cs)
}

/// True when running in exception context (IPSR != 0)
#[inline]
pub fn is_isr_context() -> bool {
    #[cfg(target_arch = "arm")]
    {
        let ipsr: u32;
        unsafe {
            core::arch::asm!(
                "mrs {}, IPSR",
                out(reg) ipsr,
                options(nomem, nostack, preserves_flags)
            );
        }
        ipsr != 0
    }

    #[cfg(not(target_arch = "arm"))]
    {
        false
    }
}
