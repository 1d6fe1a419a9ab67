//! Headless monitor: a running solver driven through the bridge.
//!
//! Demonstrates:
//!   1. Spawning the simulation thread with a step-rate limit
//!   2. Polling solver status through blocking injections
//!   3. Bracketing a slow operation with the busy state
//!   4. Watching the heartbeat and cache breaker from a handler thread
//!   5. Graceful shutdown that hands the solver back
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example headless_monitor

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tether_core::{MeshSpec, Simulation};
use tether_engine::{BridgeConfig, Runtime, Signals, TracingConsole};
use tether_test_utils::MockSolver;

fn main() {
    tracing_subscriber::fmt::init();

    let config = BridgeConfig {
        step_rate_hz: Some(200.0),
        ..BridgeConfig::default()
    };
    let signals = Signals::detached();
    let mut rt = match Runtime::spawn(
        MockSolver::new(),
        config,
        signals.clone(),
        Arc::new(TracingConsole),
    ) {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("cannot start bridge: {e}");
            return;
        }
    };
    let inj = rt.injector();

    // A handler thread polling status, as a browser refresh would.
    let poller = {
        let inj = inj.clone();
        let signals = signals.clone();
        thread::spawn(move || {
            for _ in 0..10 {
                signals.heartbeat.touch();
                if signals.busy.is_busy() {
                    println!("poll: busy");
                } else if let Ok(status) = inj.call("status", |s: &mut MockSolver| s.status()) {
                    println!(
                        "poll: step {:>4}  t = {:.6e} s  breaker {}",
                        status.nsteps,
                        status.time,
                        signals.cache.current()
                    );
                }
                thread::sleep(Duration::from_millis(50));
            }
        })
    };

    // A slow remesh, bracketed as busy on the simulation thread.
    thread::sleep(Duration::from_millis(120));
    signals.cache.bump();
    let busy = Arc::clone(&signals.busy);
    let mesh = MeshSpec {
        cells: [64, 64, 1],
        cell_size: [4e-9, 4e-9, 2e-9],
        pbc: [0, 0, 0],
    };
    let result = inj.call("setmesh", move |s: &mut MockSolver| {
        let _busy = busy.enter();
        s.mesh_delay = Duration::from_millis(150);
        s.set_mesh(&mesh)
    });
    println!("remesh: {result:?}");

    if poller.join().is_err() {
        eprintln!("poller panicked");
    }
    println!(
        "heartbeat seen {:?} ago",
        signals.heartbeat.since_last_seen()
    );

    let report = rt.shutdown();
    println!(
        "shutdown in {} ms: {} commands, {} steps",
        report.total_ms, report.commands_executed, report.steps
    );
    if let Some(sim) = rt.into_simulation() {
        println!("final step count {}", sim.nsteps);
    }
}
