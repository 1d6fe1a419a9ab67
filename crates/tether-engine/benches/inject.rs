//! Criterion micro-benchmarks for command injection latency.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use tether_engine::{channel, BridgeConfig, Runtime, Signals, TracingConsole};
use tether_test_utils::MockSolver;

/// Benchmark: enqueue then drain 100 commands on the same thread.
fn bench_submit_drain_100(c: &mut Criterion) {
    let (inj, queue) = channel::<u64>(None, Arc::new(TracingConsole));
    let mut state = 0u64;
    c.bench_function("submit_drain_100", |b| {
        b.iter(|| {
            for i in 0..100u64 {
                inj.submit("add", move |s: &mut u64| *s += i).unwrap();
            }
            black_box(queue.drain(&mut state));
        });
    });
}

/// Benchmark: blocking round trip to a paused simulation thread.
fn bench_call_round_trip(c: &mut Criterion) {
    let rt = Runtime::spawn(
        MockSolver::paused(),
        BridgeConfig::default(),
        Signals::detached(),
        Arc::new(TracingConsole),
    )
    .unwrap();
    let inj = rt.injector();
    c.bench_function("call_round_trip_paused", |b| {
        b.iter(|| black_box(inj.call("read", |s: &mut MockSolver| s.nsteps).unwrap()));
    });
}

/// Benchmark: blocking round trip while the solver steps continuously.
fn bench_call_round_trip_stepping(c: &mut Criterion) {
    let rt = Runtime::spawn(
        MockSolver::new(),
        BridgeConfig::default(),
        Signals::detached(),
        Arc::new(TracingConsole),
    )
    .unwrap();
    let inj = rt.injector();
    c.bench_function("call_round_trip_stepping", |b| {
        b.iter(|| black_box(inj.call("read", |s: &mut MockSolver| s.nsteps).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_submit_drain_100,
    bench_call_round_trip,
    bench_call_round_trip_stepping
);
criterion_main!(benches);
