//! Error types for the control surface.

use tether_core::{CompileError, InjectError, StepError};
use thiserror::Error;

/// Errors from building a [`Registry`](crate::registry::Registry).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The name is already registered in the same table.
    #[error("{kind} '{name}' is already registered")]
    Duplicate {
        /// `"quantity"` or `"parameter"`.
        kind: &'static str,
        /// The duplicated name.
        name: String,
    },
    /// Names must be non-empty and free of whitespace.
    #[error("invalid {kind} name '{name}'")]
    InvalidName {
        /// `"quantity"` or `"parameter"`.
        kind: &'static str,
        /// The rejected name.
        name: String,
    },
}

/// Errors from the [`EvalPipeline`](crate::eval::EvalPipeline).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The text did not compile. Already reported to the console; no
    /// command was scheduled.
    #[error("{text}: {source}")]
    Compile {
        /// The original text.
        text: String,
        /// The compiler's description.
        source: CompileError,
    },
    /// The compiled unit could not be queued.
    #[error(transparent)]
    Inject(#[from] InjectError),
}

/// Errors from handling a control page event.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ControlError {
    /// The event id is not bound to any handler.
    #[error("unknown event '{id}'")]
    UnknownEvent {
        /// The event id.
        id: String,
    },
    /// A page field is missing or does not parse as the expected type.
    #[error("field '{id}': {reason}")]
    BadField {
        /// The page field id.
        id: String,
        /// What was wrong with it.
        reason: String,
    },
    /// A parameter or quantity name is not in the registry.
    #[error("'{name}' is not registered")]
    NotRegistered {
        /// The missing name.
        name: String,
    },
    /// Script evaluation could not be scheduled.
    #[error(transparent)]
    Eval(#[from] EvalError),
    /// Command injection failed.
    #[error(transparent)]
    Inject(#[from] InjectError),
    /// The solver rejected an operation.
    #[error(transparent)]
    Step(#[from] StepError),
}
