//! Integration test: simulation loop behaviour under pausing, step
//! failures and blocking submissions from the simulation thread.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tether_core::InjectError;
use tether_engine::{BridgeConfig, Runtime, Signals, TracingConsole};
use tether_test_utils::MockSolver;

fn spawn(sim: MockSolver, config: BridgeConfig) -> Runtime<MockSolver> {
    Runtime::spawn(sim, config, Signals::detached(), Arc::new(TracingConsole)).unwrap()
}

fn wait_until(deadline: Duration, mut f: impl FnMut() -> bool) -> bool {
    let end = Instant::now() + deadline;
    while Instant::now() < end {
        if f() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    f()
}

#[test]
fn paused_solver_wakes_on_command() {
    let config = BridgeConfig {
        idle_poll_ms: 1_000,
        ..BridgeConfig::default()
    };
    let rt = spawn(MockSolver::paused(), config);
    let inj = rt.injector();

    let start = Instant::now();
    inj.submit_and_wait("resume", |s: &mut MockSolver| {
        s.paused = false;
        s.run_for = Some(10);
    })
    .unwrap();
    assert!(
        wait_until(Duration::from_millis(500), || rt.loop_metrics().steps == 10),
        "solver did not resume promptly"
    );
    assert!(start.elapsed() < Duration::from_millis(900));
}

#[test]
fn stepping_disabled_after_consecutive_failures() {
    let sim = MockSolver {
        fail_steps: u32::MAX,
        ..MockSolver::new()
    };
    let config = BridgeConfig {
        max_consecutive_step_failures: 3,
        ..BridgeConfig::default()
    };
    let rt = spawn(sim, config);
    assert!(wait_until(Duration::from_secs(5), || rt
        .loop_metrics()
        .stepping_disabled));

    let m = rt.loop_metrics();
    assert_eq!(m.step_failures, 3);
    assert_eq!(m.steps, 0);

    // Commands are still served.
    let n = rt
        .injector()
        .call("read", |s: &mut MockSolver| s.nsteps)
        .unwrap();
    assert_eq!(n, 0);
    assert_eq!(rt.loop_metrics().step_failures, 3);
}

#[test]
fn transient_failures_do_not_disable_stepping() {
    let sim = MockSolver {
        fail_steps: 2,
        run_for: Some(5),
        ..MockSolver::new()
    };
    let rt = spawn(sim, BridgeConfig::default());
    assert!(wait_until(Duration::from_secs(5), || rt.loop_metrics().steps == 5));
    let m = rt.loop_metrics();
    assert_eq!(m.step_failures, 2);
    assert!(!m.stepping_disabled);
}

#[test]
fn blocking_submit_from_sim_thread_is_rejected() {
    let rt = spawn(MockSolver::paused(), BridgeConfig::default());
    let inner = rt.injector();
    let nested = rt
        .injector()
        .call("nest", move |_: &mut MockSolver| {
            let blocking = inner.call("inner", |s: &mut MockSolver| s.nsteps);
            let queued = inner.submit("later", |s: &mut MockSolver| s.nsteps += 100);
            (blocking, queued.is_ok())
        })
        .unwrap();
    assert_eq!(nested.0, Err(InjectError::Reentrant));
    assert!(nested.1, "fire-and-forget from the sim thread is allowed");

    let sim = rt.into_simulation().unwrap();
    assert_eq!(sim.nsteps, 100);
}

#[test]
fn step_rate_limits_throughput() {
    let config = BridgeConfig {
        step_rate_hz: Some(100.0),
        ..BridgeConfig::default()
    };
    let rt = spawn(MockSolver::new(), config);
    thread::sleep(Duration::from_millis(200));
    let steps = rt.loop_metrics().steps;
    assert!(steps <= 30, "{steps} steps in 200 ms at 100 Hz");
    assert!(steps >= 5, "only {steps} steps in 200 ms at 100 Hz");
}

#[test]
fn invalid_config_rejected_before_spawn() {
    let config = BridgeConfig {
        step_rate_hz: Some(0.0),
        ..BridgeConfig::default()
    };
    let result = Runtime::spawn(
        MockSolver::new(),
        config,
        Signals::detached(),
        Arc::new(TracingConsole),
    );
    assert!(result.is_err());
}
