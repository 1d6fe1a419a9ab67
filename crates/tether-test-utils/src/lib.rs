//! Test utilities and mock collaborators for tether development.
//!
//! Provides a scriptable [`MockSolver`], matching [`MockParam`] and
//! [`MockQuantity`] registry entries, a tiny assignment-only
//! [`AssignCompiler`], and recording doubles for the [`Console`] and
//! [`ControlGate`] traits.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod script;
pub mod solver;

pub use script::{Assign, AssignCompiler};
pub use solver::{MockParam, MockQuantity, MockSolver};

use std::sync::{Mutex, PoisonError};

use tether_core::{Console, ControlGate};

/// One line written to a [`RecordingConsole`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleLine {
    Input(String),
    Output(String),
}

/// Console that keeps every line for later inspection.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    lines: Mutex<Vec<ConsoleLine>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn inputs(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|l| match l {
                ConsoleLine::Input(s) => Some(s),
                ConsoleLine::Output(_) => None,
            })
            .collect()
    }

    pub fn outputs(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|l| match l {
                ConsoleLine::Output(s) => Some(s),
                ConsoleLine::Input(_) => None,
            })
            .collect()
    }

    fn push(&self, line: ConsoleLine) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }
}

impl Console for RecordingConsole {
    fn log_input(&self, text: &str) {
        self.push(ConsoleLine::Input(text.to_owned()));
    }

    fn log_output(&self, text: &str) {
        self.push(ConsoleLine::Output(text.to_owned()));
    }
}

/// Control gate that records every projection it receives.
#[derive(Debug, Default)]
pub struct RecordingGate {
    history: Mutex<Vec<bool>>,
}

impl RecordingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `set_controls_enabled` argument, oldest first.
    pub fn history(&self) -> Vec<bool> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The last projection, or `true` if none was ever pushed.
    pub fn enabled(&self) -> bool {
        self.history().last().copied().unwrap_or(true)
    }
}

impl ControlGate for RecordingGate {
    fn set_controls_enabled(&self, enabled: bool) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(enabled);
    }
}
