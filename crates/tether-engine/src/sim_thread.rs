//! Simulation loop: command draining interleaved with stepping.
//!
//! The simulation thread owns the solver exclusively (moved in via
//! `thread::spawn`). Other threads reach it only through the command
//! queue, which this loop drains before every step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tether_core::{Simulation, StepOutcome};

use crate::inject::CommandQueue;
use crate::metrics::LoopCounters;

/// Consecutive-failure tracker. Disables stepping once the limit is hit.
#[derive(Debug)]
pub(crate) struct FailureTracker {
    consecutive: u32,
    limit: u32,
}

impl FailureTracker {
    pub fn new(limit: u32) -> Self {
        Self {
            consecutive: 0,
            limit: limit.max(1),
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Returns `true` on the failure that reaches the limit.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive = self.consecutive.saturating_add(1);
        self.consecutive == self.limit
    }

    pub fn is_disabled(&self) -> bool {
        self.consecutive >= self.limit
    }
}

/// State held by the simulation thread's main loop.
pub(crate) struct SimThreadState<S> {
    sim: S,
    queue: CommandQueue<S>,
    shutdown_flag: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    step_budget: Option<Duration>,
    idle_poll: Duration,
    failures: FailureTracker,
    counters: Arc<LoopCounters>,
}

impl<S: Simulation> SimThreadState<S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sim: S,
        queue: CommandQueue<S>,
        shutdown_flag: Arc<AtomicBool>,
        stopped: Arc<AtomicBool>,
        step_budget: Option<Duration>,
        idle_poll: Duration,
        failure_limit: u32,
        counters: Arc<LoopCounters>,
    ) -> Self {
        Self {
            sim,
            queue,
            shutdown_flag,
            stopped,
            step_budget,
            idle_poll,
            failures: FailureTracker::new(failure_limit),
            counters,
        }
    }

    /// Main loop. Runs until `shutdown_flag` is set.
    ///
    /// Consumes self and returns the solver so the caller can recover it
    /// via `JoinHandle<S>`.
    pub fn run(mut self) -> S {
        self.queue.bind_current_thread();
        tracing::info!("simulation thread started");

        while !self.shutdown_flag.load(Ordering::Acquire) {
            let step_start = Instant::now();

            // 1. Drain injected commands.
            self.drain();

            // 2. Step, unless disabled.
            if self.failures.is_disabled() {
                self.wait(self.idle_poll, false);
                continue;
            }
            match self.sim.step() {
                Ok(StepOutcome::Advanced) => {
                    self.failures.record_success();
                    self.counters.steps.fetch_add(1, Ordering::Relaxed);
                }
                Ok(StepOutcome::Idle) => {
                    // Nothing to do: block on the queue rather than spin.
                    self.wait(self.idle_poll, true);
                    continue;
                }
                Err(e) => {
                    self.counters.step_failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %e, "step failed");
                    if self.failures.record_failure() {
                        self.counters
                            .stepping_disabled
                            .store(true, Ordering::Release);
                        tracing::error!(
                            limit = self.failures.limit,
                            "stepping disabled after consecutive failures; still serving commands"
                        );
                    }
                }
            }

            // 3. Spend the rest of the step budget serving commands.
            if let Some(budget) = self.step_budget {
                if let Some(remaining) = budget.checked_sub(step_start.elapsed()) {
                    self.wait(remaining, false);
                }
            }
        }

        // Anything submitted before the shutdown flag was raised still runs.
        self.drain();
        self.stopped.store(true, Ordering::Release);
        tracing::info!("simulation thread stopped");
        self.sim
    }

    fn drain(&mut self) {
        let start = Instant::now();
        let ran = self.queue.drain(&mut self.sim);
        if ran > 0 {
            self.record_drain(ran, start);
        }
    }

    /// Serve commands until `duration` has elapsed or shutdown is raised.
    /// With `wake_on_command`, return as soon as one batch has run.
    fn wait(&mut self, duration: Duration, wake_on_command: bool) {
        let deadline = Instant::now() + duration;
        loop {
            if self.shutdown_flag.load(Ordering::Acquire) {
                return;
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return;
            };
            if remaining.is_zero() {
                return;
            }
            let start = Instant::now();
            let ran = self.queue.wait_and_drain(&mut self.sim, remaining);
            if ran > 0 {
                self.record_drain(ran, start);
                // A command may have changed what step() will do (e.g.
                // resumed a paused run).
                if wake_on_command {
                    return;
                }
            }
        }
    }

    fn record_drain(&self, ran: usize, start: Instant) {
        let us = start.elapsed().as_micros().min(u128::from(u64::MAX)) as u64;
        self.counters.drain_passes.fetch_add(1, Ordering::Relaxed);
        self.counters.last_drain_us.store(us, Ordering::Relaxed);
        tracing::trace!(commands = ran, elapsed_us = us, "drained command queue");
    }
}
