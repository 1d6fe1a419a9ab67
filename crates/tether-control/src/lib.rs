//! Control page layer for the tether bridge.
//!
//! Wires a [`Page`] of published values, an immutable [`Registry`] of
//! quantities and parameters, and an [`EvalPipeline`] into a
//! [`ControlSurface`] that turns inbound page events and periodic
//! refresh polls into commands on the simulation thread.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod eval;
pub mod events;
pub mod mesh;
pub mod page;
pub mod refresh;
pub mod registry;
pub mod surface;

pub use config::ControlConfig;
pub use error::{ControlError, EvalError, RegistryError};
pub use eval::EvalPipeline;
pub use events::Event;
pub use page::{Page, Value};
pub use refresh::{ParamReading, RefreshOutcome, Snapshot};
pub use registry::{Registry, RegistryBuilder};
pub use surface::{ControlSurface, EventOutcome};
