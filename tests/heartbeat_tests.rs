//! Heartbeat service tests
//!
//! The heartbeat task runs on a host thread. Its sleeper keeps a virtual
//! clock and, in stepping mode, parks inside every sleep until the test lets
//! it go, so each edge can be checked against the clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use heartbeat::config::{CFG_HEARTBEAT_STK_SIZE, CFG_PRIO_LOW, CFG_PRIO_NORMAL};
use heartbeat::heartbeat::{HeartbeatStatus, NoLines};
use heartbeat::task::{OsTaskFn, Tcb};
use heartbeat::types::{Prio, StkElement};
use heartbeat::{
    HeartbeatConfig, HeartbeatRegistry, HeartbeatService, HeartbeatState, LineDriver, LineId,
    OsError, OsResult, Sleep, TaskSpawner,
};

const LINE_X: LineId = LineId::new(0, 5);
const LINE_Y: LineId = LineId::new(1, 3);

// ============ Simulation ============

#[derive(Default)]
struct Sim {
    now: Duration,
    /// (time, line, level) for every line write
    edges: Vec<(Duration, LineId, bool)>,
    sleeps: Vec<Duration>,
}

type SharedSim = Arc<Mutex<Sim>>;

struct SimLines(SharedSim);

impl LineDriver for SimLines {
    fn set(&mut self, line: LineId, level: bool) {
        let mut sim = self.0.lock().unwrap();
        let now = sim.now;
        sim.edges.push((now, line, level));
    }
}

/// Line driver that only records being dropped
struct DropLines(Arc<AtomicBool>);

impl LineDriver for DropLines {
    fn set(&mut self, _line: LineId, _level: bool) {}
}

impl Drop for DropLines {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Blocks in every sleep until the test resumes it
struct StepSleep {
    sim: SharedSim,
    entered: Sender<Duration>,
    resume: Receiver<()>,
}

impl Sleep for StepSleep {
    fn sleep(&mut self, period: Duration) {
        self.sim.lock().unwrap().sleeps.push(period);
        let _ = self.entered.send(period);
        if self.resume.recv().is_err() {
            // Test finished; stay asleep.
            loop {
                thread::park();
            }
        }
        self.sim.lock().unwrap().now += period;
    }
}

struct Stepper {
    entered: Receiver<Duration>,
    resume: Sender<()>,
}

impl Stepper {
    /// Wait until the task is inside its next sleep.
    fn next_sleep(&self) -> Duration {
        self.entered
            .recv_timeout(Duration::from_secs(5))
            .expect("heartbeat task stalled")
    }

    fn resume(&self) {
        self.resume.send(()).unwrap();
    }
}

fn step_sleep(sim: &SharedSim) -> (StepSleep, Stepper) {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (resume_tx, resume_rx) = mpsc::channel();
    (
        StepSleep { sim: sim.clone(), entered: entered_tx, resume: resume_rx },
        Stepper { entered: entered_rx, resume: resume_tx },
    )
}

/// Advances the clock without blocking, then parks for good after `limit`
/// sleeps
struct FreeRunSleep {
    sim: SharedSim,
    limit: usize,
    count: usize,
    done: Sender<()>,
}

impl Sleep for FreeRunSleep {
    fn sleep(&mut self, period: Duration) {
        self.count += 1;
        if self.count == self.limit {
            let _ = self.done.send(());
            loop {
                thread::park();
            }
        }
        self.sim.lock().unwrap().now += period;
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Spawned {
    name: &'static str,
    prio: Prio,
    stack_len: usize,
}

/// Runs each task on its own detached thread
#[derive(Default)]
struct ThreadSpawner {
    spawned: Vec<Spawned>,
}

impl TaskSpawner for ThreadSpawner {
    fn spawn(
        &mut self,
        _tcb: &'static mut Tcb,
        stack: &'static mut [StkElement],
        name: &'static str,
        entry: OsTaskFn,
        arg: *mut (),
        prio: Prio,
    ) -> OsResult<()> {
        self.spawned.push(Spawned { name, prio, stack_len: stack.len() });
        let arg = arg as usize;
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                entry(arg as *mut ());
            })
            .expect("spawn heartbeat thread");
        Ok(())
    }
}

struct FailingSpawner(OsError);

impl TaskSpawner for FailingSpawner {
    fn spawn(
        &mut self,
        _tcb: &'static mut Tcb,
        _stack: &'static mut [StkElement],
        _name: &'static str,
        _entry: OsTaskFn,
        _arg: *mut (),
        _prio: Prio,
    ) -> OsResult<()> {
        Err(self.0)
    }
}

fn service<D: 'static, S: 'static>() -> &'static mut HeartbeatService<D, S> {
    Box::leak(Box::new(HeartbeatService::new()))
}

fn config(line: Option<LineId>, high_ms: u64, low_ms: u64) -> HeartbeatConfig {
    HeartbeatConfig::new(
        line,
        Duration::from_millis(high_ms),
        Duration::from_millis(low_ms),
        CFG_PRIO_NORMAL,
    )
}

fn edges(sim: &SharedSim) -> Vec<(Duration, LineId, bool)> {
    sim.lock().unwrap().edges.clone()
}

// ============ Tests ============

#[test]
fn test_duty_cycle_follows_periods() {
    let sim = SharedSim::default();
    let (sleeper, stepper) = step_sleep(&sim);
    let registry = HeartbeatRegistry::new();
    let mut spawner = ThreadSpawner::default();

    let high = Duration::from_millis(250);
    let low = Duration::from_millis(750);
    let handle = service()
        .start(
            &registry,
            &mut spawner,
            config(Some(LINE_X), 250, 750),
            SimLines(sim.clone()),
            sleeper,
        )
        .unwrap();

    let mut expected = Vec::new();
    let mut t = Duration::ZERO;
    for _ in 0..3 {
        assert_eq!(stepper.next_sleep(), high);
        expected.push((t, LINE_X, true));
        assert_eq!(edges(&sim), expected);
        assert!(handle.level());
        stepper.resume();
        t += high;

        assert_eq!(stepper.next_sleep(), low);
        expected.push((t, LINE_X, false));
        assert_eq!(edges(&sim), expected);
        assert!(!handle.level());
        stepper.resume();
        t += low;
    }

    assert_eq!(stepper.next_sleep(), high);
    assert_eq!(handle.cycles(), 3);
    assert_eq!(handle.state(), HeartbeatState::Running);
}

#[test]
fn test_second_start_on_same_line_rejected() {
    let sim = SharedSim::default();
    let (sleeper, stepper) = step_sleep(&sim);
    let registry = HeartbeatRegistry::new();
    let mut spawner = ThreadSpawner::default();

    let cfg = HeartbeatConfig::new(
        Some(LINE_X),
        Duration::from_secs(10),
        Duration::from_secs(10),
        CFG_PRIO_LOW,
    );
    let first = service()
        .start(&registry, &mut spawner, cfg, SimLines(sim.clone()), sleeper)
        .unwrap();

    assert_eq!(stepper.next_sleep(), Duration::from_secs(10));
    stepper.resume();
    assert_eq!(stepper.next_sleep(), Duration::from_secs(10));

    // Task is parked mid-cycle (low) while the second start is attempted.
    let other_sim = SharedSim::default();
    let (other_sleeper, _other_stepper) = step_sleep(&other_sim);
    let second = service().start(
        &registry,
        &mut spawner,
        cfg,
        SimLines(other_sim.clone()),
        other_sleeper,
    );
    assert_eq!(second.err(), Some(OsError::HeartbeatAlreadyRunning));
    assert_eq!(spawner.spawned.len(), 1);
    assert!(other_sim.lock().unwrap().edges.is_empty());

    stepper.resume();
    for _ in 0..3 {
        stepper.next_sleep();
        stepper.resume();
    }
    stepper.next_sleep();

    let seen = edges(&sim);
    assert_eq!(seen.len(), 6);
    for (i, (t, line, level)) in seen.iter().enumerate() {
        assert_eq!(*line, LINE_X);
        assert_eq!(*level, i % 2 == 0, "edge {i} out of order");
        assert_eq!(*t, Duration::from_secs(10) * i as u32);
    }
    assert_eq!(first.state(), HeartbeatState::Running);
    assert_eq!(first.prio(), CFG_PRIO_LOW);
    assert!(registry.is_running(LINE_X));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_lineless_heartbeat_keeps_timing() {
    let sim = SharedSim::default();
    let (sleeper, stepper) = step_sleep(&sim);
    let registry = HeartbeatRegistry::new();
    let mut spawner = ThreadSpawner::default();

    let handle = service()
        .start(&registry, &mut spawner, config(None, 100, 300), SimLines(sim.clone()), sleeper)
        .unwrap();
    assert_eq!(handle.line(), None);

    for _ in 0..4 {
        assert_eq!(stepper.next_sleep(), Duration::from_millis(100));
        assert!(handle.level());
        stepper.resume();
        assert_eq!(stepper.next_sleep(), Duration::from_millis(300));
        assert!(!handle.level());
        stepper.resume();
    }
    stepper.next_sleep();

    let sim = sim.lock().unwrap();
    assert!(sim.edges.is_empty());
    assert_eq!(sim.now, Duration::from_millis(400) * 4);
    assert_eq!(sim.sleeps.len(), 9);
    for (i, period) in sim.sleeps.iter().enumerate() {
        let expected = if i % 2 == 0 { 100 } else { 300 };
        assert_eq!(*period, Duration::from_millis(expected));
    }
    assert_eq!(handle.cycles(), 4);
    // Nothing to claim without a line.
    assert!(registry.is_empty());
}

#[test]
fn test_lineless_heartbeats_do_not_conflict() {
    let registry = HeartbeatRegistry::new();
    let mut spawner = ThreadSpawner::default();

    for _ in 0..2 {
        let sim = SharedSim::default();
        let (sleeper, _stepper) = step_sleep(&sim);
        let handle = service::<NoLines, StepSleep>()
            .start(&registry, &mut spawner, config(None, 10, 10), NoLines, sleeper)
            .unwrap();
        assert_eq!(handle.state(), HeartbeatState::Running);
    }
    assert_eq!(spawner.spawned.len(), 2);
}

#[test]
fn test_runs_past_ten_thousand_cycles() {
    const CYCLES: usize = 10_000;

    let sim = SharedSim::default();
    let (done_tx, done_rx) = mpsc::channel();
    let sleeper = FreeRunSleep { sim: sim.clone(), limit: CYCLES * 2 + 1, count: 0, done: done_tx };
    let registry = HeartbeatRegistry::new();
    let mut spawner = ThreadSpawner::default();

    let handle = service()
        .start(&registry, &mut spawner, config(Some(LINE_Y), 1, 1), SimLines(sim.clone()), sleeper)
        .unwrap();

    done_rx
        .recv_timeout(Duration::from_secs(30))
        .expect("heartbeat did not reach the cycle count");

    assert_eq!(handle.cycles(), CYCLES as u32);
    assert_eq!(handle.state(), HeartbeatState::Running);
    // Parked inside the first sleep of the next cycle, so the line is high.
    assert!(handle.level());

    let sim = sim.lock().unwrap();
    assert_eq!(sim.edges.len(), CYCLES * 2 + 1);
    assert!(sim.edges.windows(2).all(|w| w[0].2 != w[1].2));
}

#[test]
fn test_spawn_request() {
    let registry = HeartbeatRegistry::new();
    let mut spawner = ThreadSpawner::default();
    let sim = SharedSim::default();
    let (sleeper, _stepper) = step_sleep(&sim);

    let hb = service::<SimLines, StepSleep>();
    assert_eq!(hb.state(), HeartbeatState::Idle);

    let mut cfg = config(Some(LINE_Y), 5, 5);
    cfg.prio = CFG_PRIO_LOW;
    hb.start(&registry, &mut spawner, cfg, SimLines(sim.clone()), sleeper).unwrap();

    assert_eq!(
        spawner.spawned,
        vec![Spawned { name: "heartbeat", prio: CFG_PRIO_LOW, stack_len: CFG_HEARTBEAT_STK_SIZE }]
    );
}

#[test]
fn test_spawn_failure_releases_line() {
    let registry = HeartbeatRegistry::new();
    let sim = SharedSim::default();
    let (sleeper, _stepper) = step_sleep(&sim);

    let result = service().start(
        &registry,
        &mut FailingSpawner(OsError::StkSizeInvalid),
        config(Some(LINE_X), 10, 10),
        SimLines(sim.clone()),
        sleeper,
    );
    assert_eq!(result.err(), Some(OsError::StkSizeInvalid));
    assert!(!registry.is_running(LINE_X));

    let (sleeper, stepper) = step_sleep(&sim);
    let handle = service()
        .start(
            &registry,
            &mut ThreadSpawner::default(),
            config(Some(LINE_X), 10, 10),
            SimLines(sim.clone()),
            sleeper,
        )
        .unwrap();
    stepper.next_sleep();
    assert_eq!(handle.line(), Some(LINE_X));
    assert!(registry.is_running(LINE_X));
}

#[test]
fn test_spawn_failure_drops_driver() {
    let registry = HeartbeatRegistry::new();
    let sim = SharedSim::default();
    let (sleeper, _stepper) = step_sleep(&sim);
    let dropped = Arc::new(AtomicBool::new(false));

    let result = service().start(
        &registry,
        &mut FailingSpawner(OsError::PrioInvalid),
        config(Some(LINE_X), 10, 10),
        DropLines(dropped.clone()),
        sleeper,
    );

    assert_eq!(result.err(), Some(OsError::PrioInvalid));
    assert!(dropped.load(Ordering::SeqCst));
    assert!(!registry.is_running(LINE_X));
    assert!(sim.lock().unwrap().edges.is_empty());
}

#[test]
fn test_invalid_config_never_claims() {
    let registry = HeartbeatRegistry::new();
    let mut spawner = ThreadSpawner::default();
    let sim = SharedSim::default();
    let (sleeper, _stepper) = step_sleep(&sim);

    let result = service().start(
        &registry,
        &mut spawner,
        config(Some(LINE_X), 0, 10),
        SimLines(sim.clone()),
        sleeper,
    );
    assert_eq!(result.err(), Some(OsError::HeartbeatPeriodInvalid));
    assert!(registry.is_empty());
    assert!(spawner.spawned.is_empty());
}

#[test]
fn test_status_starts_idle() {
    let status = HeartbeatStatus::new();
    assert!(!status.is_running());
    assert!(!status.level());
    assert_eq!(status.cycles(), 0);
}
