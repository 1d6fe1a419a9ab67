//! Collaborator traits.
//!
//! The bridge never implements numerics, scripting or rendering itself.
//! It reaches those through the traits below, all of which are object
//! safe so collaborators can be swapped at startup.

use smallvec::SmallVec;

use crate::error::{CompileError, ParamError, ScriptError, StepError};
use crate::id::RegionId;
use crate::solver::{MeshSpec, SolverStatus, StepOutcome};

/// Per-region parameter value. Scalars and 3-vectors stay inline.
pub type ParamValue = SmallVec<[f64; 3]>;

/// The solver driven by the simulation thread.
///
/// Owned exclusively by that thread. Injected commands receive it as
/// `&mut Self`, which is the only way other threads can reach it.
pub trait Simulation: Send + 'static {
    /// Advance by one step, or report that there is nothing to do.
    fn step(&mut self) -> Result<StepOutcome, StepError>;

    /// Current solver figures for display.
    fn status(&self) -> SolverStatus;

    /// Replace the mesh geometry. May be slow (kernel re-initialization).
    fn set_mesh(&mut self, mesh: &MeshSpec) -> Result<(), StepError>;

    /// Free device memory in MiB, when the backend can report it.
    fn free_memory_mib(&self) -> Option<u64> {
        None
    }
}

/// Script compiler: turns text into an executable unit.
///
/// Compilation happens on the calling (handler) thread; only
/// [`Executable::eval`] runs on the simulation thread.
pub trait Compiler<S>: Send + Sync {
    /// Compile `text`, or explain why it is not a valid statement.
    fn compile(&self, text: &str) -> Result<Box<dyn Executable<S>>, CompileError>;
}

/// A compiled, side-effecting script unit.
pub trait Executable<S>: Send {
    /// Normalized source text, used for the input log.
    fn format(&self) -> String;

    /// Run the unit against the simulation state.
    fn eval(&self, sim: &mut S) -> Result<(), ScriptError>;
}

/// Script console log.
///
/// Assumed non-blocking and infallible from the bridge's point of view.
pub trait Console: Send + Sync {
    /// Record a statement that is about to be executed.
    fn log_input(&self, text: &str);

    /// Record output or an error description.
    fn log_output(&self, text: &str);
}

/// Sink for the derived "controls enabled" projection of the busy state.
pub trait ControlGate: Send + Sync {
    /// Enable or disable the state-mutating controls.
    fn set_controls_enabled(&self, enabled: bool);
}

/// A displayable quantity (render target) of the simulation.
pub trait Quantity<S>: Send + Sync {
    /// Number of components (1 for scalars, 3 for vectors).
    fn n_comp(&self) -> usize;

    /// SI unit, empty when dimensionless.
    fn unit(&self) -> &str;

    /// One-line description shown next to the render selector.
    fn doc(&self) -> &str {
        ""
    }
}

/// An adjustable, region-wise material parameter.
pub trait Param<S>: Send + Sync {
    /// Number of components (1 for scalars, 3 for vectors).
    fn n_comp(&self) -> usize;

    /// SI unit, empty when dimensionless.
    fn unit(&self) -> &str;

    /// One-line description.
    fn doc(&self) -> &str {
        ""
    }

    /// Value in `region`.
    fn region(&self, sim: &S, region: RegionId) -> ParamValue;

    /// Set the value in `region`.
    fn set_region(&self, sim: &mut S, region: RegionId, value: &[f64]) -> Result<(), ParamError>;

    /// Whether every region currently holds the same value.
    fn is_uniform(&self, sim: &S) -> bool;
}
