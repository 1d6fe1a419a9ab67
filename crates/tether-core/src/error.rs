//! Error types shared across the bridge.
//!
//! Organized by subsystem: injection (command queue), stepping (solver),
//! compilation and evaluation (script collaborator), and parameter
//! access (registry entries).

use thiserror::Error;

use crate::id::RegionId;

/// Errors from submitting a command to the simulation thread.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InjectError {
    /// The simulation thread has shut down; the command was not queued
    /// or was discarded before it ran.
    #[error("simulation thread has shut down")]
    Shutdown,
    /// A blocking submission was attempted from the simulation thread
    /// itself, which would never be drained.
    #[error("cannot wait on an injected command from the simulation thread")]
    Reentrant,
    /// The command ran but faulted. The fault was contained and the
    /// consumer loop kept running.
    #[error("command '{label}' faulted: {message}")]
    Faulted {
        /// Label the command was submitted with.
        label: String,
        /// Panic payload or error description.
        message: String,
    },
}

/// Errors reported by the solver collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StepError {
    /// A time step failed. The loop logs it and carries on until the
    /// consecutive-failure limit is reached.
    #[error("step failed: {reason}")]
    Failed {
        /// Solver-provided description.
        reason: String,
    },
    /// A mesh reconfiguration was rejected.
    #[error("invalid mesh: {reason}")]
    InvalidMesh {
        /// Which constraint the mesh violated.
        reason: String,
    },
}

/// Errors from compiling user-supplied script text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The text is not valid syntax.
    #[error("syntax error at {position}: {message}")]
    Syntax {
        /// Byte offset of the offending token.
        position: usize,
        /// What the parser expected.
        message: String,
    },
    /// The text refers to a name the world does not define.
    #[error("undefined: {name}")]
    Undefined {
        /// The unknown identifier.
        name: String,
    },
    /// The value has the wrong number of components for its target.
    #[error("{name} expects {expected} component(s), got {found}")]
    Arity {
        /// Assignment target.
        name: String,
        /// Component count of the target.
        expected: usize,
        /// Component count supplied.
        found: usize,
    },
}

/// Errors raised while evaluating an already-compiled unit.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ScriptError {
    /// The target disappeared between compilation and evaluation.
    #[error("no such target: {name}")]
    UnknownTarget {
        /// The missing target.
        name: String,
    },
    /// A parameter write was rejected.
    #[error(transparent)]
    Param(#[from] ParamError),
}

/// Errors from reading or writing a registered parameter.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParamError {
    /// The supplied value has the wrong component count.
    #[error("{name}: expected {expected} component(s), got {found}")]
    ComponentCount {
        /// Parameter name.
        name: String,
        /// Declared component count.
        expected: usize,
        /// Supplied component count.
        found: usize,
    },
    /// The region is not defined on the current mesh.
    #[error("region {region} is not defined")]
    UndefinedRegion {
        /// The region that was addressed.
        region: RegionId,
    },
    /// A supplied component is not a finite number.
    #[error("{name}: component {component} is not finite")]
    NotFinite {
        /// Parameter name.
        name: String,
        /// Index of the offending component.
        component: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faulted_message_carries_label_and_cause() {
        let e = InjectError::Faulted {
            label: "set_mesh".into(),
            message: "index out of bounds".into(),
        };
        assert_eq!(
            e.to_string(),
            "command 'set_mesh' faulted: index out of bounds"
        );
    }

    #[test]
    fn script_error_wraps_param_error() {
        let e: ScriptError = ParamError::UndefinedRegion {
            region: RegionId(9),
        }
        .into();
        assert_eq!(e.to_string(), "region 9 is not defined");
    }
}
