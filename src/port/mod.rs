//! Port layer - CPU-specific context switching
//!
//! The Cortex-M4 port is used on ARM; everything else gets a stub so the
//! kernel and heartbeat logic build and test on the host.

#[cfg(target_arch = "arm")]
pub mod cortex_m4;

#[cfg(target_arch = "arm")]
pub use cortex_m4::*;

#[cfg(not(target_arch = "arm"))]
pub mod stub {
    use crate::task::OsTaskFn;
    use crate::types::StkElement;

    pub unsafe fn os_start_high_rdy() {
        panic!("os_start_high_rdy not available on this platform");
    }

    pub fn os_ctx_sw() {}

    pub fn os_int_ctx_sw() {}

    /// No frame to build; hand back the top word.
    pub unsafe fn os_task_stk_init(
        _task_fn: OsTaskFn,
        _arg: *mut (),
        stk_base: *mut StkElement,
        stk_size: usize,
    ) -> *mut StkElement {
        unsafe { stk_base.add(stk_size - 1) }
    }

    pub fn os_cpu_systick_init(_reload: u32) {}
}

#[cfg(not(target_arch = "arm"))]
pub use stub::*;
