//! Text → compiled unit → exactly one injected command.

use std::sync::Arc;

use tether_core::{CommandSeq, Compiler, Console, Simulation};
use tether_engine::Injector;

use crate::error::EvalError;

/// Compiles script text on the calling thread and runs the result on the
/// simulation thread.
pub struct EvalPipeline<S> {
    compiler: Arc<dyn Compiler<S>>,
    injector: Injector<S>,
    console: Arc<dyn Console>,
}

impl<S> Clone for EvalPipeline<S> {
    fn clone(&self) -> Self {
        Self {
            compiler: Arc::clone(&self.compiler),
            injector: self.injector.clone(),
            console: Arc::clone(&self.console),
        }
    }
}

impl<S: Simulation> EvalPipeline<S> {
    /// Pipeline submitting through `injector`.
    pub fn new(
        compiler: Arc<dyn Compiler<S>>,
        injector: Injector<S>,
        console: Arc<dyn Console>,
    ) -> Self {
        Self {
            compiler,
            injector,
            console,
        }
    }

    /// Compile `text` and, if it compiles, log its normalized form and
    /// submit one command that evaluates it.
    ///
    /// A compile failure is logged as `text` followed by the error on the
    /// next line, and nothing is scheduled. Evaluation errors surface on
    /// the console when the command runs.
    pub fn eval(&self, text: &str) -> Result<CommandSeq, EvalError> {
        let unit = match self.compiler.compile(text) {
            Ok(unit) => unit,
            Err(source) => {
                self.console.log_output(&format!("{text}\n{source}"));
                return Err(EvalError::Compile {
                    text: text.to_owned(),
                    source,
                });
            }
        };

        let formatted = unit.format();
        self.console.log_input(&formatted);
        let console = Arc::clone(&self.console);
        let seq = self.injector.submit("eval", move |sim: &mut S| {
            if let Err(e) = unit.eval(sim) {
                console.log_output(&format!("{formatted}\n{e}"));
            }
        })?;
        tracing::debug!(%seq, "script unit queued");
        Ok(seq)
    }
}
