//! Busy/idle state machine gating state-mutating operations.
//!
//! Long-running operations on the simulation thread (mesh
//! reconfiguration, kernel warm-up) bracket themselves with
//! [`BusyState::enter`]. While busy, the refresh routine skips its
//! injected read and mutating controls are disabled.
//!
//! # Lock discipline
//!
//! The busy state has its own mutex. The control gate is updated while
//! it is held, so the projection follows transitions in the order they
//! happen. The heartbeat is touched after it is released, so this type
//! never holds two of the bridge's locks at once and never touches the
//! command queue.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tether_core::ControlGate;

use crate::heartbeat::Heartbeat;

/// The two states of the busy machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Activity {
    /// Safe to submit mutating commands.
    #[default]
    Idle,
    /// The simulation thread is mid-operation.
    Busy,
}

impl Activity {
    fn of(busy: bool) -> Self {
        if busy {
            Activity::Busy
        } else {
            Activity::Idle
        }
    }
}

/// Open brackets plus the explicit override.
#[derive(Debug, Default)]
struct Depth {
    brackets: usize,
    held: bool,
}

impl Depth {
    fn is_busy(&self) -> bool {
        self.brackets > 0 || self.held
    }
}

/// Shared busy state plus its derived "controls enabled" projection.
///
/// Busy while any [`BusyGuard`] is alive or the override set by
/// [`set_busy`](Self::set_busy) is on. Brackets from different threads
/// may overlap and end in any order.
pub struct BusyState {
    depth: Mutex<Depth>,
    gate: Arc<dyn ControlGate>,
    heartbeat: Arc<Heartbeat>,
}

// Compile-time assertion: BusyState must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<BusyState>();
};

impl BusyState {
    /// Start idle. `gate` receives the controls-enabled projection;
    /// `heartbeat` is refreshed on every transition call.
    pub fn new(gate: Arc<dyn ControlGate>, heartbeat: Arc<Heartbeat>) -> Self {
        Self {
            depth: Mutex::new(Depth::default()),
            gate,
            heartbeat,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Depth> {
        self.depth.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `change` and return the state before it. The gate is only
    /// told when the state actually flips, unless `always_project`.
    fn transition(&self, always_project: bool, change: impl FnOnce(&mut Depth)) -> Activity {
        let (was, now) = {
            let mut depth = self.lock();
            let was = depth.is_busy();
            change(&mut depth);
            let now = depth.is_busy();
            if always_project || was != now {
                self.gate.set_controls_enabled(!now);
            }
            (was, now)
        };
        self.heartbeat.touch();
        if was != now {
            tracing::debug!(busy = now, "busy state changed");
        }
        Activity::of(was)
    }

    /// Switch the explicit override and return the previous state.
    ///
    /// Open brackets keep the machine busy regardless. Always re-applies
    /// the side effects, even when the state did not change: controls
    /// follow the resulting state and the heartbeat is touched so a long
    /// busy period is not mistaken for a disconnect.
    pub fn set_busy(&self, busy: bool) -> Activity {
        self.transition(true, |d| d.held = busy)
    }

    /// Whether the simulation thread is mid-operation.
    pub fn is_busy(&self) -> bool {
        self.lock().is_busy()
    }

    /// Current state.
    pub fn state(&self) -> Activity {
        Activity::of(self.is_busy())
    }

    /// Enter the busy state until the returned guard is dropped.
    ///
    /// The machine returns to idle once every open bracket has ended,
    /// whatever order they end in.
    pub fn enter(&self) -> BusyGuard<'_> {
        self.transition(false, |d| d.brackets += 1);
        BusyGuard { state: self }
    }

    fn leave(&self) {
        self.transition(false, |d| d.brackets = d.brackets.saturating_sub(1));
    }

    /// Re-enable the controls if, and only if, the machine is idle.
    ///
    /// Used by the refresh routine to clear a lingering disabled state.
    /// The check and the enable happen under one lock, so a bracket
    /// opened concurrently is never un-gated. Returns whether it was idle.
    pub fn enable_controls_if_idle(&self) -> bool {
        let depth = self.lock();
        let idle = !depth.is_busy();
        if idle {
            self.gate.set_controls_enabled(true);
        }
        idle
    }
}

impl std::fmt::Debug for BusyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let depth = self.lock();
        f.debug_struct("BusyState")
            .field("brackets", &depth.brackets)
            .field("held", &depth.held)
            .finish_non_exhaustive()
    }
}

/// RAII bracket returned by [`BusyState::enter`].
#[must_use = "dropping the guard immediately ends the busy period"]
pub struct BusyGuard<'a> {
    state: &'a BusyState,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.leave();
    }
}

/// A gate that ignores the projection. For headless runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetachedGate;

impl ControlGate for DetachedGate {
    fn set_controls_enabled(&self, _enabled: bool) {}
}
