//! Global kernel state and bring-up
//!
//! Owns the run flags, the scheduler tables and the CPU switch state that
//! the port layer reads from PendSV.

use core::ptr::NonNull;
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use crate::config::{
    CFG_CPU_CLOCK_HZ, CFG_PRIO_IDLE, CFG_PRIO_MAX, CFG_TICK_RATE_HZ, CFG_TICK_WHEEL_SIZE,
};
use crate::core::cs_cell::CsCell;
use crate::critical::{critical_section, CriticalSection};
use crate::error::{OsError, OsResult};
use crate::prio::PrioBitmap;
use crate::sched::ReadyList;
use crate::task::Tcb;
use crate::types::{NestingCtr, Prio, StkElement, Tick};

// ============ Kernel Flags ============

/// Atomic kernel flags
pub struct KernelFlags {
    initialized: AtomicBool,
    running: AtomicBool,
    int_nesting: AtomicU8,
    tick_counter: AtomicU32,
}

impl KernelFlags {
    const fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            running: AtomicBool::new(false),
            int_nesting: AtomicU8::new(0),
            tick_counter: AtomicU32::new(0),
        }
    }

    fn reset(&self) {
        self.initialized.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        self.int_nesting.store(0, Ordering::SeqCst);
        self.tick_counter.store(0, Ordering::SeqCst);
    }

    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Ticks since `os_start`
    #[inline(always)]
    pub fn tick_get(&self) -> Tick {
        self.tick_counter.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub fn int_nesting(&self) -> NestingCtr {
        self.int_nesting.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    #[inline(always)]
    pub(crate) fn tick_increment(&self) -> Tick {
        self.tick_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    #[inline(always)]
    pub(crate) fn int_enter(&self) {
        if self.is_running() {
            let _ = self.int_nesting.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_add(1))
            });
        }
    }

    /// Returns the nesting level after leaving
    #[inline(always)]
    pub(crate) fn int_exit(&self) -> NestingCtr {
        let prev = self
            .int_nesting
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_sub(1)))
            .unwrap_or(0);
        prev.saturating_sub(1)
    }
}

/// Global kernel state instance
pub(crate) static KERNEL: KernelFlags = KernelFlags::new();

// ============ Scheduler Tables ============

/// Scheduler state
pub struct SchedState {
    pub(crate) prio_map: PrioBitmap,
    pub(crate) rdy_list: [ReadyList; CFG_PRIO_MAX],
    pub(crate) tick_wheel: [Option<NonNull<Tcb>>; CFG_TICK_WHEEL_SIZE],
}

impl SchedState {
    const fn new() -> Self {
        Self {
            prio_map: PrioBitmap::new(),
            rdy_list: [ReadyList::new(); CFG_PRIO_MAX],
            tick_wheel: [None; CFG_TICK_WHEEL_SIZE],
        }
    }

    #[inline(always)]
    fn wheel_slot(tick: Tick) -> usize {
        (tick as usize) % CFG_TICK_WHEEL_SIZE
    }

    /// Park a task in the slot of its expiry tick.
    ///
    /// # Safety
    /// `tcb` valid and not on the wheel.
    pub(crate) unsafe fn tick_wheel_insert(&mut self, tcb: NonNull<Tcb>, expiry: Tick) {
        let tcb_ref = unsafe { &mut *tcb.as_ptr() };
        let slot = Self::wheel_slot(expiry);

        tcb_ref.tick_wheel_slot = slot as u8;
        tcb_ref.tick_prev_ptr = None;
        tcb_ref.tick_next_ptr = self.tick_wheel[slot];

        if let Some(old_head) = self.tick_wheel[slot] {
            unsafe { (*old_head.as_ptr()).tick_prev_ptr = Some(tcb) };
        }
        self.tick_wheel[slot] = Some(tcb);
    }

    /// # Safety
    /// `tcb` valid and currently on the wheel.
    pub(crate) unsafe fn tick_wheel_remove(&mut self, tcb: NonNull<Tcb>) {
        let tcb_ref = unsafe { &mut *tcb.as_ptr() };
        let slot = tcb_ref.tick_wheel_slot as usize;

        match tcb_ref.tick_prev_ptr {
            Some(prev) => unsafe { (*prev.as_ptr()).tick_next_ptr = tcb_ref.tick_next_ptr },
            None => self.tick_wheel[slot] = tcb_ref.tick_next_ptr,
        }
        if let Some(next) = tcb_ref.tick_next_ptr {
            unsafe { (*next.as_ptr()).tick_prev_ptr = tcb_ref.tick_prev_ptr };
        }

        tcb_ref.tick_next_ptr = None;
        tcb_ref.tick_prev_ptr = None;
    }

    #[inline(always)]
    pub(crate) fn tick_wheel_head(&self, tick: Tick) -> Option<NonNull<Tcb>> {
        self.tick_wheel[Self::wheel_slot(tick)]
    }
}

pub(crate) static SCHED: CsCell<SchedState> = CsCell::new(SchedState::new());

// ============ CPU Switch State ============

/// Context switch state shared with the PendSV handler
///
/// Layout is fixed: PendSV loads `tcb_cur` from offset 0.
#[repr(C)]
pub struct CpuState {
    /// Running task
    pub tcb_cur: *mut Tcb,
    /// Task PendSV should switch to
    pub tcb_high_rdy: *mut Tcb,
    pub prio_cur: Prio,
    pub prio_high_rdy: Prio,
}

impl CpuState {
    pub const fn new() -> Self {
        Self {
            tcb_cur: core::ptr::null_mut(),
            tcb_high_rdy: core::ptr::null_mut(),
            prio_cur: 0,
            prio_high_rdy: 0,
        }
    }
}

#[no_mangle]
#[used]
pub static mut CPU_STATE: CpuState = CpuState::new();

// ============ Idle Task ============

static mut IDLE_TCB: Tcb = Tcb::new();
static mut IDLE_STK: [StkElement; 128] = [0; 128];

fn os_idle_task(_: *mut ()) -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}

// ============ Public API ============

/// Initialize the kernel
///
/// Clears all scheduler state and creates the idle task. Call once, before
/// creating application tasks.
///
/// # Returns
/// * `Err(OsError::OsRunning)` - multitasking already started
#[allow(static_mut_refs)]
pub fn os_init() -> OsResult<()> {
    if KERNEL.is_running() {
        return Err(OsError::OsRunning);
    }

    KERNEL.reset();

    critical_section(|cs| {
        *SCHED.get(cs) = SchedState::new();
        unsafe { CPU_STATE = CpuState::new() };

        unsafe {
            crate::task::os_task_init(
                &raw mut IDLE_TCB,
                "idle",
                os_idle_task,
                core::ptr::null_mut(),
                CFG_PRIO_IDLE,
                IDLE_STK.as_mut_ptr(),
                IDLE_STK.len(),
            );
        }

        KERNEL.initialized.store(true, Ordering::SeqCst);
    });

    crate::debug!("kernel initialized");
    Ok(())
}

/// Start multitasking
///
/// Arms SysTick and switches to the highest-priority ready task. Does not
/// return on success.
///
/// # Returns
/// * `Err(OsError::OsNotInit)` - `os_init` was not called
/// * `Err(OsError::OsRunning)` - already started
pub fn os_start() -> OsResult<()> {
    if !KERNEL.is_initialized() {
        return Err(OsError::OsNotInit);
    }
    if KERNEL.is_running() {
        return Err(OsError::OsRunning);
    }

    critical_section(|cs| {
        let sched = SCHED.get(cs);
        let high_prio = sched.prio_map.highest();
        // The idle task guarantees a non-empty list at the lowest level.
        if let Some(head) = sched.rdy_list[high_prio as usize].head() {
            unsafe {
                CPU_STATE.prio_high_rdy = high_prio;
                CPU_STATE.prio_cur = high_prio;
                CPU_STATE.tcb_high_rdy = head.as_ptr();
            }
            KERNEL.set_running(true);
        }
    });

    crate::info!("kernel starting");
    crate::port::os_cpu_systick_init(CFG_CPU_CLOCK_HZ / CFG_TICK_RATE_HZ);

    unsafe { crate::port::os_start_high_rdy() };

    Ok(())
}

/// Leave an ISR, switching tasks if the ISR readied something more urgent.
pub fn os_int_exit() {
    if !KERNEL.is_running() {
        return;
    }

    let _cs = CriticalSection::enter();

    if KERNEL.int_nesting() == 0 || KERNEL.int_exit() != 0 {
        return;
    }

    unsafe {
        let sched = SCHED.get_unchecked();
        let high_prio = sched.prio_map.highest();
        if high_prio < CPU_STATE.prio_cur {
            if let Some(head) = sched.rdy_list[high_prio as usize].head() {
                set_high_rdy(high_prio, head);
                crate::port::os_int_ctx_sw();
            }
        }
    }
}

// ============ Crate-internal accessors ============

/// # Safety
/// Caller holds a critical section (or is the tick ISR).
#[inline(always)]
pub(crate) unsafe fn sched() -> &'static mut SchedState {
    unsafe { SCHED.get_unchecked() }
}

#[inline]
#[allow(static_mut_refs)]
pub(crate) unsafe fn tcb_cur_ptr() -> Option<NonNull<Tcb>> {
    unsafe { NonNull::new(CPU_STATE.tcb_cur) }
}

#[inline]
#[allow(static_mut_refs)]
pub(crate) unsafe fn set_high_rdy(prio: Prio, tcb: NonNull<Tcb>) {
    unsafe {
        CPU_STATE.prio_high_rdy = prio;
        CPU_STATE.tcb_high_rdy = tcb.as_ptr();
    }
}
