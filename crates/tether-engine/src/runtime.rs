//! User-facing [`Runtime`]: spawns the simulation thread and owns its
//! shutdown sequence.
//!
//! # Architecture
//!
//! ```text
//! Handler threads (N)                 Simulation thread
//!     |                                     |
//!     |--injector.submit()----------------->| queue.drain(&mut sim)
//!     |   [unbounded mpsc]                  | sim.step()
//!     |--injector.call()------------------->| wait on queue for the
//!     |   blocks on one-shot reply          |   rest of the step budget
//!     |<--value / fault---------------------|
//!     |                                     |
//!     |--signals.busy / heartbeat / cache   |  (independent locks,
//!     |   (never through the queue)         |   never nested)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tether_core::{Console, Simulation};

use crate::config::{BridgeConfig, ConfigError};
use crate::inject::{self, Injector};
use crate::metrics::{LoopCounters, LoopMetrics, QueueStats};
use crate::signals::Signals;
use crate::sim_thread::SimThreadState;

// ── ShutdownReport ───────────────────────────────────────────────

/// Report from [`Runtime::shutdown`].
#[derive(Clone, Debug)]
pub struct ShutdownReport {
    /// Total time spent in the shutdown sequence.
    pub total_ms: u64,
    /// Whether the simulation thread was joined and the solver recovered.
    pub joined: bool,
    /// Commands executed over the runtime's life.
    pub commands_executed: u64,
    /// Steps taken over the runtime's life.
    pub steps: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Draining,
    Stopped,
}

// ── Runtime ──────────────────────────────────────────────────────

/// A running simulation thread plus the handles request handlers need.
///
/// Handlers never touch the `Runtime` itself: they clone an
/// [`Injector`] and the [`Signals`] once and keep those.
pub struct Runtime<S: Simulation> {
    injector: Injector<S>,
    signals: Signals,
    shutdown_flag: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    sim_thread: Option<JoinHandle<S>>,
    counters: Arc<LoopCounters>,
    recovered: Option<S>,
    state: RunState,
}

impl<S: Simulation> Runtime<S> {
    /// Validate `config`, then move `sim` onto a new simulation thread.
    ///
    /// `console` receives fault reports from injected commands.
    pub fn spawn(
        sim: S,
        config: BridgeConfig,
        signals: Signals,
        console: Arc<dyn Console>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let (injector, queue) = inject::channel(config.queue_capacity, console);
        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let stopped = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(LoopCounters::default());

        let state = SimThreadState::new(
            sim,
            queue,
            Arc::clone(&shutdown_flag),
            Arc::clone(&stopped),
            config.step_budget(),
            config.idle_poll(),
            config.max_consecutive_step_failures,
            Arc::clone(&counters),
        );
        let sim_thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || state.run())
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: e.to_string(),
            })?;

        tracing::info!(
            thread = %config.thread_name,
            step_rate_hz = ?config.step_rate_hz,
            queue_capacity = ?config.queue_capacity,
            "bridge armed"
        );

        Ok(Self {
            injector,
            signals,
            shutdown_flag,
            stopped,
            sim_thread: Some(sim_thread),
            counters,
            recovered: None,
            state: RunState::Running,
        })
    }

    /// A new producer handle.
    pub fn injector(&self) -> Injector<S> {
        self.injector.clone()
    }

    /// The shared busy/heartbeat/cache primitives.
    pub fn signals(&self) -> &Signals {
        &self.signals
    }

    /// Queue counters.
    pub fn queue_stats(&self) -> QueueStats {
        self.injector.stats()
    }

    /// Loop counters.
    pub fn loop_metrics(&self) -> LoopMetrics {
        self.counters.snapshot()
    }

    /// Whether the simulation thread is still running.
    pub fn is_running(&self) -> bool {
        self.state == RunState::Running && !self.stopped.load(Ordering::Acquire)
    }

    /// Stop the simulation thread and recover the solver.
    ///
    /// 1. **Running → Draining:** raise the shutdown flag and inject a
    ///    no-op so a loop blocked on the queue wakes immediately.
    /// 2. **Draining → Stopped:** join the thread. The loop runs every
    ///    command that was queued before it saw the flag.
    ///
    /// Idempotent.
    pub fn shutdown(&mut self) -> ShutdownReport {
        if self.state == RunState::Stopped {
            return self.report(0, self.recovered.is_some());
        }
        let start = Instant::now();

        self.state = RunState::Draining;
        self.shutdown_flag.store(true, Ordering::Release);
        // Best effort: fails only if the thread already exited.
        let _ = self.injector.submit("wake", |_: &mut S| {});

        let joined = match self.sim_thread.take() {
            Some(handle) => match handle.join() {
                Ok(sim) => {
                    self.recovered = Some(sim);
                    true
                }
                Err(_) => {
                    tracing::error!("simulation thread panicked; solver state lost");
                    false
                }
            },
            None => self.recovered.is_some(),
        };
        self.state = RunState::Stopped;

        let total_ms = start.elapsed().as_millis() as u64;
        tracing::info!(total_ms, joined, "bridge shut down");
        self.report(total_ms, joined)
    }

    /// Shut down (if still running) and hand back the solver.
    pub fn into_simulation(mut self) -> Option<S> {
        self.shutdown();
        self.recovered.take()
    }

    /// Block until the simulation thread has executed everything queued
    /// so far, or `timeout` elapses. Returns whether the queue caught up.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.injector.stats().in_flight() == 0 {
                return true;
            }
            if Instant::now() > deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn report(&self, total_ms: u64, joined: bool) -> ShutdownReport {
        ShutdownReport {
            total_ms,
            joined,
            commands_executed: self.injector.stats().executed,
            steps: self.counters.snapshot().steps,
        }
    }
}

impl<S: Simulation> Drop for Runtime<S> {
    fn drop(&mut self) {
        if self.state != RunState::Stopped {
            self.shutdown();
        }
    }
}
