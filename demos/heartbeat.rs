//! Heartbeat firmware for the Nucleo-F401RE
//!
//! Blinks LD2 (PA5) 10 s on, 10 s off from a heartbeat task while the
//! application task idles.

#![no_std]
#![no_main]
#![allow(static_mut_refs)]

use cortex_m_rt::entry;
use heartbeat::heartbeat::{KernelSleep, KernelSpawner};
use heartbeat::task::Tcb;
use heartbeat::time::os_time_dly_ms;
use heartbeat::types::StkElement;
use heartbeat::{
    os_task_create, HeartbeatConfig, HeartbeatRegistry, HeartbeatService, LineId, CFG_PRIO_NORMAL,
};

#[cfg(feature = "pac")]
use heartbeat::heartbeat::PacLines as Lines;
#[cfg(not(feature = "pac"))]
use heartbeat::heartbeat::NoLines as Lines;

const LED: LineId = LineId::new(0, 5);

// ============ Task Storage ============

static REGISTRY: HeartbeatRegistry = HeartbeatRegistry::new();
static mut HEARTBEAT: HeartbeatService<Lines, KernelSleep> = HeartbeatService::new();

static mut APP_STK: [StkElement; 256] = [0; 256];
static mut APP_TCB: Tcb = Tcb::new();

fn board_init() -> Lines {
    #[allow(unused_mut)]
    let mut lines = Lines::default();
    #[cfg(feature = "pac")]
    lines.configure_output(LED);
    lines
}

fn app_task(_: *mut ()) -> ! {
    heartbeat::info!("app task started");
    loop {
        let _ = os_time_dly_ms(500);
    }
}

// ============ Main ============

#[entry]
fn main() -> ! {
    let lines = board_init();

    heartbeat::os_init().expect("kernel init failed");

    let handle = unsafe { &mut HEARTBEAT }
        .start(
            &REGISTRY,
            &mut KernelSpawner,
            HeartbeatConfig::on_line(LED),
            lines,
            KernelSleep,
        )
        .expect("heartbeat start failed");
    heartbeat::info!("heartbeat on line {=u16}", handle.line().map_or(0, |l| l.raw()));

    os_task_create(
        unsafe { &mut APP_TCB },
        unsafe { &mut APP_STK },
        "app",
        app_task,
        CFG_PRIO_NORMAL,
    )
    .expect("app task failed");

    heartbeat::info!("starting kernel");
    heartbeat::os_start().expect("kernel start failed");

    loop {
        cortex_m::asm::nop();
    }
}
