//! Injected command type and its completion signal.
//!
//! A [`Command`] is a one-shot unit of work destined for the simulation
//! thread. It owns a boxed closure that receives the simulation state by
//! exclusive reference, so the type system guarantees the work runs
//! where the state lives and nowhere else.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crossbeam_channel::Sender;

use crate::id::CommandSeq;

/// How an injected command ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The closure returned normally.
    Completed,
    /// The closure panicked. The panic was caught at the command boundary.
    Faulted {
        /// Panic payload rendered as text.
        message: String,
    },
}

type Job<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// A single unit of work for the simulation thread.
///
/// Created by a producer, handed to the queue, executed exactly once via
/// [`execute`](Command::execute), then dropped. A command that is dropped
/// without being executed or [`abandon`](Command::abandon)ed logs a
/// warning, so work is never lost silently.
///
/// # Examples
///
/// ```
/// use tether_core::{Command, CommandSeq, Completion};
///
/// let cmd = Command::new(CommandSeq(0), "double", |x: &mut u32| *x *= 2);
/// let mut state = 21;
/// assert_eq!(cmd.execute(&mut state), Completion::Completed);
/// assert_eq!(state, 42);
/// ```
pub struct Command<S> {
    seq: CommandSeq,
    label: Cow<'static, str>,
    job: Option<Job<S>>,
    done: Option<Sender<Completion>>,
}

impl<S> Command<S> {
    /// Wrap a closure as a command.
    pub fn new<F>(seq: CommandSeq, label: impl Into<Cow<'static, str>>, job: F) -> Self
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        Self {
            seq,
            label: label.into(),
            job: Some(Box::new(job)),
            done: None,
        }
    }

    /// Attach a one-shot completion channel. The outcome is sent on it
    /// after the closure has run, whether it completed or faulted.
    pub fn with_completion(mut self, done: Sender<Completion>) -> Self {
        self.done = Some(done);
        self
    }

    /// Queue sequence number.
    pub fn seq(&self) -> CommandSeq {
        self.seq
    }

    /// Human-readable label used in logs and fault reports.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether a producer is blocked waiting for this command.
    pub fn has_waiter(&self) -> bool {
        self.done.is_some()
    }

    /// Run the command inside a guarded frame.
    ///
    /// A panic inside the closure is caught and turned into
    /// [`Completion::Faulted`]. The waiter, if any, is released in every
    /// case.
    pub fn execute(mut self, state: &mut S) -> Completion {
        let completion = match self.job.take() {
            Some(job) => match panic::catch_unwind(AssertUnwindSafe(|| job(state))) {
                Ok(()) => Completion::Completed,
                Err(payload) => Completion::Faulted {
                    message: panic_message(payload.as_ref()),
                },
            },
            None => Completion::Completed,
        };
        if let Some(done) = self.done.take() {
            // The waiter may have given up; nothing to do then.
            let _ = done.send(completion.clone());
        }
        completion
    }

    /// Drop the command without running it and without the discard
    /// warning. Used when the producer already reports the failure to
    /// enqueue to its caller.
    pub fn abandon(mut self) {
        self.job = None;
    }
}

impl<S> Drop for Command<S> {
    fn drop(&mut self) {
        if self.job.is_some() {
            tracing::warn!(
                seq = self.seq.0,
                label = %self.label,
                "command discarded before it ran"
            );
        }
    }
}

impl<S> fmt::Debug for Command<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("seq", &self.seq)
            .field("label", &self.label)
            .field("pending", &self.job.is_some())
            .field("has_waiter", &self.done.is_some())
            .finish()
    }
}

/// Render a panic payload as text.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "command panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_runs_closure_once() {
        let mut hits = 0u32;
        let cmd = Command::new(CommandSeq(1), "inc", |h: &mut u32| *h += 1);
        assert_eq!(cmd.execute(&mut hits), Completion::Completed);
        assert_eq!(hits, 1);
    }

    #[test]
    fn panic_becomes_fault_and_releases_waiter() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let cmd = Command::new(CommandSeq(2), "boom", |_: &mut ()| panic!("kaboom"))
            .with_completion(tx);
        assert!(cmd.has_waiter());

        let completion = cmd.execute(&mut ());
        assert_eq!(
            completion,
            Completion::Faulted {
                message: "kaboom".into()
            }
        );
        assert_eq!(rx.recv().unwrap(), completion);
    }

    #[test]
    fn formatted_panic_payload_is_preserved() {
        let n = 3;
        let cmd = Command::new(CommandSeq(3), "fmt", move |_: &mut ()| {
            panic!("region {n} missing")
        });
        assert_eq!(
            cmd.execute(&mut ()),
            Completion::Faulted {
                message: "region 3 missing".into()
            }
        );
    }

    #[test]
    fn dropping_unexecuted_command_disconnects_waiter() {
        let (tx, rx) = crossbeam_channel::bounded::<Completion>(1);
        let cmd = Command::new(CommandSeq(4), "never", |_: &mut ()| {}).with_completion(tx);
        cmd.abandon();
        assert!(rx.recv().is_err());
    }

    #[test]
    fn debug_shows_label_and_state() {
        let cmd = Command::new(CommandSeq(5), "probe", |_: &mut ()| {});
        let s = format!("{cmd:?}");
        assert!(s.contains("probe"));
        assert!(s.contains("pending: true"));
        cmd.abandon();
    }
}
