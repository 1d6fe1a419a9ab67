//! Counters for the command queue and the simulation loop.
//!
//! The counters themselves are atomics shared between producers and the
//! simulation thread. [`QueueStats`] and [`LoopMetrics`] are plain
//! point-in-time copies for callers (tests, telemetry, the control page).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Point-in-time copy of the command queue counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Commands accepted into the queue (both submission kinds).
    pub submitted: u64,
    /// Of those, commands whose producer blocked for completion.
    pub waited: u64,
    /// Commands executed by the consumer, faulted ones included.
    pub executed: u64,
    /// Commands whose closure panicked.
    pub faulted: u64,
}

impl QueueStats {
    /// Commands accepted but not yet executed.
    pub fn in_flight(&self) -> u64 {
        self.submitted.saturating_sub(self.executed)
    }
}

#[derive(Debug, Default)]
pub(crate) struct QueueCounters {
    pub submitted: AtomicU64,
    pub waited: AtomicU64,
    pub executed: AtomicU64,
    pub faulted: AtomicU64,
}

impl QueueCounters {
    pub fn snapshot(&self) -> QueueStats {
        QueueStats {
            submitted: self.submitted.load(Ordering::Acquire),
            waited: self.waited.load(Ordering::Acquire),
            executed: self.executed.load(Ordering::Acquire),
            faulted: self.faulted.load(Ordering::Acquire),
        }
    }
}

/// Point-in-time copy of the simulation loop counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopMetrics {
    /// Steps that advanced the solver.
    pub steps: u64,
    /// Steps that returned an error.
    pub step_failures: u64,
    /// Drain passes that executed at least one command.
    pub drain_passes: u64,
    /// Duration of the most recent non-empty drain pass, in microseconds.
    pub last_drain_us: u64,
    /// Whether stepping was disabled after consecutive failures.
    pub stepping_disabled: bool,
}

#[derive(Debug, Default)]
pub(crate) struct LoopCounters {
    pub steps: AtomicU64,
    pub step_failures: AtomicU64,
    pub drain_passes: AtomicU64,
    pub last_drain_us: AtomicU64,
    pub stepping_disabled: AtomicBool,
}

impl LoopCounters {
    pub fn snapshot(&self) -> LoopMetrics {
        LoopMetrics {
            steps: self.steps.load(Ordering::Acquire),
            step_failures: self.step_failures.load(Ordering::Acquire),
            drain_passes: self.drain_passes.load(Ordering::Acquire),
            last_drain_us: self.last_drain_us.load(Ordering::Acquire),
            stepping_disabled: self.stepping_disabled.load(Ordering::Acquire),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        assert_eq!(QueueCounters::default().snapshot(), QueueStats::default());
        let m = LoopCounters::default().snapshot();
        assert_eq!(m.steps, 0);
        assert!(!m.stepping_disabled);
    }

    #[test]
    fn in_flight_is_submitted_minus_executed() {
        let s = QueueStats {
            submitted: 7,
            waited: 2,
            executed: 5,
            faulted: 1,
        };
        assert_eq!(s.in_flight(), 2);
    }
}
