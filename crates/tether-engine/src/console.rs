//! Default [`Console`] that forwards to `tracing`.

use tether_core::Console;

/// Logs script input and output as `tracing` events under the
/// `tether::console` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingConsole;

impl Console for TracingConsole {
    fn log_input(&self, text: &str) {
        tracing::info!(target: "tether::console", input = text);
    }

    fn log_output(&self, text: &str) {
        tracing::warn!(target: "tether::console", output = text);
    }
}
