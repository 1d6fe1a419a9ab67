//! Command-injection bridge between request handlers and a simulation
//! thread.
//!
//! Handlers hold an [`Injector`] and a set of [`Signals`]; the
//! [`Runtime`] owns the simulation thread, which drains injected
//! commands before every solver step. Busy state, heartbeat and the
//! render cache breaker live outside the queue so that status polling
//! never waits behind a long-running command.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod busy;
pub mod cache;
pub mod config;
pub mod console;
pub mod heartbeat;
pub mod inject;
pub mod metrics;
pub mod runtime;
pub mod signals;

mod sim_thread;

pub use busy::{Activity, BusyGuard, BusyState, DetachedGate};
pub use cache::CacheBreaker;
pub use config::{BridgeConfig, ConfigError};
pub use console::TracingConsole;
pub use heartbeat::Heartbeat;
pub use inject::{channel, CommandQueue, Injector};
pub use metrics::{LoopMetrics, QueueStats};
pub use runtime::{Runtime, ShutdownReport};
pub use signals::Signals;

// Compile-time Send + Sync assertions for the handles shared across
// handler threads.
const _: fn() = || {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<Injector<()>>();
    assert_sync::<Injector<()>>();
    assert_send::<Signals>();
    assert_sync::<Signals>();
};
