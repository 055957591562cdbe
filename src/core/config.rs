//! Compile-time configuration
//!
//! These constants control kernel resource limits and heartbeat defaults.

use crate::types::Prio;

/// Maximum number of priority levels
pub const CFG_PRIO_MAX: usize = 64;

/// System tick rate in Hz
pub const CFG_TICK_RATE_HZ: u32 = 1000;

/// Core clock feeding SysTick (HSI on STM32F401 out of reset)
pub const CFG_CPU_CLOCK_HZ: u32 = 16_000_000;

/// Time quanta for round-robin between equal priorities
pub const CFG_TIME_QUANTA_DEFAULT: u32 = 10;

/// Minimum task stack size in words
pub const CFG_STK_SIZE_MIN: usize = 64;

/// Number of entries in tick wheel
pub const CFG_TICK_WHEEL_SIZE: usize = 16;

/// Enable round-robin scheduling for same-priority tasks
pub const CFG_SCHED_ROUND_ROBIN_EN: bool = true;

/// Idle task priority
pub const CFG_PRIO_IDLE: Prio = (CFG_PRIO_MAX - 1) as Prio;

/// Priority for ordinary application tasks
pub const CFG_PRIO_NORMAL: Prio = (CFG_PRIO_MAX / 2) as Prio;

/// Priority for background housekeeping, still above idle
pub const CFG_PRIO_LOW: Prio = CFG_PRIO_IDLE - 8;

/// Heartbeat task stack size in words
pub const CFG_HEARTBEAT_STK_SIZE: usize = 128;

/// Maximum number of lines with a running heartbeat
pub const CFG_HEARTBEAT_MAX: usize = 4;

/// Default heartbeat half-period in milliseconds
pub const CFG_HEARTBEAT_PERIOD_MS: u64 = 10_000;
