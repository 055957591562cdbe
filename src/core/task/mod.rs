//! Task creation
//!
//! Tasks live in caller-provided static storage: a [`Tcb`] and a word
//! array for the stack. Neither is ever released.

mod tcb;

pub use tcb::Tcb;

use core::ptr::NonNull;

use crate::config::{CFG_PRIO_IDLE, CFG_STK_SIZE_MIN, CFG_TIME_QUANTA_DEFAULT};
use crate::critical::{critical_section, is_isr_context};
use crate::error::{OsError, OsResult};
use crate::types::{Prio, StkElement, TaskState};

/// Task entry point function type
pub type OsTaskFn = fn(*mut ()) -> !;

/// Create a task from static storage
///
/// # Arguments
/// * `tcb` - Task Control Block, owned by the task from now on
/// * `stack` - Stack words, owned by the task from now on
/// * `name` - Task name for debugging
/// * `task_fn` - Entry point, must never return
/// * `prio` - Task priority (0 = highest); the idle level is reserved
///
/// # Example
/// ```ignore
/// static mut TASK_TCB: Tcb = Tcb::new();
/// static mut TASK_STK: [StkElement; 256] = [0; 256];
///
/// fn my_task(_: *mut ()) -> ! {
///     loop { /* ... */ }
/// }
///
/// os_task_create(
///     unsafe { &mut TASK_TCB },
///     unsafe { &mut TASK_STK },
///     "my_task",
///     my_task,
///     CFG_PRIO_NORMAL,
/// )?;
/// ```
pub fn os_task_create(
    tcb: &'static mut Tcb,
    stack: &'static mut [StkElement],
    name: &'static str,
    task_fn: OsTaskFn,
    prio: Prio,
) -> OsResult<()> {
    os_task_create_with_arg(tcb, stack, name, task_fn, core::ptr::null_mut(), prio)
}

/// Create a task whose entry point receives `arg`
///
/// `arg` must stay valid for the life of the task, which is forever.
pub fn os_task_create_with_arg(
    tcb: &'static mut Tcb,
    stack: &'static mut [StkElement],
    name: &'static str,
    task_fn: OsTaskFn,
    arg: *mut (),
    prio: Prio,
) -> OsResult<()> {
    if stack.len() < CFG_STK_SIZE_MIN {
        return Err(OsError::StkSizeInvalid);
    }
    if prio >= CFG_PRIO_IDLE {
        return Err(OsError::PrioInvalid);
    }
    if is_isr_context() {
        return Err(OsError::TaskCreateIsr);
    }

    critical_section(|_cs| unsafe {
        os_task_init(tcb, name, task_fn, arg, prio, stack.as_mut_ptr(), stack.len());
    });

    crate::debug!("task {=str} created at prio {=u8}", name, prio);

    // A running kernel may need to hand the CPU to the new task right away.
    crate::sched::os_sched();
    Ok(())
}

/// Fill in a TCB, build the initial stack frame and make the task ready.
///
/// # Safety
/// Interrupts masked; `tcb` and the stack region valid for `'static` and
/// not in use by another task.
pub(crate) unsafe fn os_task_init(
    tcb: *mut Tcb,
    name: &'static str,
    task_fn: OsTaskFn,
    arg: *mut (),
    prio: Prio,
    stk_base: *mut StkElement,
    stk_size: usize,
) {
    let tcb_ref = unsafe { &mut *tcb };
    *tcb_ref = Tcb::new();

    tcb_ref.name = name;
    tcb_ref.prio = prio;
    tcb_ref.time_quanta = CFG_TIME_QUANTA_DEFAULT;
    tcb_ref.time_quanta_ctr = CFG_TIME_QUANTA_DEFAULT;
    tcb_ref.state = TaskState::Ready;
    tcb_ref.stk_ptr = unsafe { crate::port::os_task_stk_init(task_fn, arg, stk_base, stk_size) };

    unsafe { crate::sched::os_rdy_list_insert(NonNull::new_unchecked(tcb)) };
}
