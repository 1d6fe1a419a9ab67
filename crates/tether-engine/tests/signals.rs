//! Integration test: heartbeat, busy state and cache breaker used from
//! many threads at once.

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use tether_engine::{Activity, Signals};
use tether_test_utils::RecordingGate;

#[test]
fn heartbeat_never_moves_backwards_under_contention() {
    let signals = Signals::detached();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let hb = Arc::clone(&signals.heartbeat);
            thread::spawn(move || {
                let mut last = hb.last_seen();
                for _ in 0..1_000 {
                    hb.touch();
                    let now = hb.last_seen();
                    assert!(now >= last);
                    last = now;
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn busy_bracket_projects_onto_gate() {
    let gate = Arc::new(RecordingGate::new());
    let signals = Signals::new(gate.clone());
    {
        let _busy = signals.busy.enter();
        assert_eq!(signals.busy.state(), Activity::Busy);
        assert!(!gate.enabled());
    }
    assert_eq!(signals.busy.state(), Activity::Idle);
    assert!(gate.enabled());
    assert_eq!(gate.history(), vec![false, true]);
}

#[test]
fn busy_transitions_refresh_heartbeat() {
    let signals = Signals::detached();
    let before = signals.heartbeat.last_seen();
    signals.busy.set_busy(true);
    assert!(signals.heartbeat.last_seen() >= before);
    signals.busy.set_busy(false);
    assert!(signals.heartbeat.last_seen() >= before);
}

proptest! {
    #[test]
    fn breaker_strictly_increases_across_threads(threads in 1usize..6, bumps in 1u64..200) {
        let signals = Signals::detached();
        let start = signals.cache.current();
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let cache = Arc::clone(&signals.cache);
                thread::spawn(move || {
                    let mut last = 0;
                    for _ in 0..bumps {
                        let v = cache.bump();
                        assert!(v > last);
                        last = v;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        prop_assert_eq!(signals.cache.current(), start + threads as u64 * bumps);
    }
}
