//! Core types and traits for the tether control bridge.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: the injected
//! [`Command`] type, strongly-typed ids, error enums, and the traits
//! through which the bridge talks to its collaborators (the solver, the
//! script compiler, the console log and the control gate).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod command;
pub mod error;
pub mod id;
pub mod solver;
pub mod traits;

pub use command::{Command, Completion};
pub use error::{CompileError, InjectError, ParamError, ScriptError, StepError};
pub use id::{CommandSeq, RegionId, RegionSelection};
pub use solver::{MeshSpec, SolverStatus, StepOutcome};
pub use traits::{
    Compiler, Console, ControlGate, Executable, Param, ParamValue, Quantity, Simulation,
};
