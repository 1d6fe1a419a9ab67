//! Tether: a command-injection bridge between a live control page and a
//! single-threaded simulation loop.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all tether sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use tether::prelude::*;
//!
//! // A solver that counts steps until it is told to stop.
//! struct Counter {
//!     nsteps: u64,
//!     limit: u64,
//! }
//!
//! impl Simulation for Counter {
//!     fn step(&mut self) -> Result<StepOutcome, StepError> {
//!         if self.nsteps >= self.limit {
//!             return Ok(StepOutcome::Idle);
//!         }
//!         self.nsteps += 1;
//!         Ok(StepOutcome::Advanced)
//!     }
//!     fn status(&self) -> SolverStatus {
//!         SolverStatus { nsteps: self.nsteps, ..SolverStatus::default() }
//!     }
//!     fn set_mesh(&mut self, mesh: &MeshSpec) -> Result<(), StepError> {
//!         mesh.validate()
//!     }
//! }
//!
//! let rt = Runtime::spawn(
//!     Counter { nsteps: 0, limit: 10 },
//!     BridgeConfig::default(),
//!     Signals::detached(),
//!     Arc::new(TracingConsole),
//! )
//! .unwrap();
//!
//! // Raise the limit from another thread and wait for it to take effect.
//! rt.injector()
//!     .submit_and_wait("extend", |c: &mut Counter| c.limit = 20)
//!     .unwrap();
//! let limit = rt.injector().call("read", |c: &mut Counter| c.limit).unwrap();
//! assert_eq!(limit, 20);
//!
//! let sim = rt.into_simulation().unwrap();
//! assert!(sim.nsteps <= 20);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tether-core` | Ids, command type, errors, collaborator traits |
//! | [`engine`] | `tether-engine` | Command queue, simulation thread, busy/heartbeat/cache signals |
//! | [`control`] | `tether-control` | Control page, registry, refresh, eval pipeline |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and ids (`tether-core`).
pub use tether_core as types;

/// Command queue, simulation thread and shared signals (`tether-engine`).
///
/// [`engine::Runtime`] owns the simulation thread; handlers keep an
/// [`engine::Injector`] and [`engine::Signals`].
pub use tether_engine as engine;

/// Control page layer (`tether-control`).
///
/// [`control::ControlSurface`] dispatches page events and refresh polls.
pub use tether_control as control;

/// Common imports for typical tether usage.
///
/// ```rust
/// use tether::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use tether_core::{
        CommandSeq, Compiler, Console, ControlGate, Executable, MeshSpec, Param, ParamValue,
        Quantity, RegionId, RegionSelection, Simulation, SolverStatus, StepOutcome,
    };

    // Errors
    pub use tether_core::{CompileError, InjectError, ParamError, ScriptError, StepError};

    // Engine
    pub use tether_engine::{
        Activity, BridgeConfig, BusyState, CacheBreaker, Heartbeat, Injector, Runtime, Signals,
        TracingConsole,
    };

    // Control
    pub use tether_control::{
        ControlConfig, ControlError, ControlSurface, EvalPipeline, EventOutcome, Page,
        RefreshOutcome, Registry, RegistryBuilder, Snapshot,
    };
}
