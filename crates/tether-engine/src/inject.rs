//! Multi-producer, single-consumer command queue.
//!
//! [`channel`] returns an [`Injector`] (cloneable producer handle, one
//! per request handler) and the [`CommandQueue`] consumed by the
//! simulation thread.
//!
//! # Ordering
//!
//! Commands from one producer execute in submission order. Across
//! producers the only guarantee is queue arrival order.
//!
//! # Failure containment
//!
//! Every command runs inside [`Command::execute`]'s guarded frame. A
//! panicking command is logged through the [`Console`] and counted; the
//! consumer loop keeps going and a blocked producer is released with
//! [`InjectError::Faulted`].

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tether_core::{Command, CommandSeq, Completion, Console, InjectError};

use crate::metrics::{QueueCounters, QueueStats};

/// State shared by every producer and the consumer.
#[derive(Debug, Default)]
struct Shared {
    next_seq: AtomicU64,
    consumer: OnceLock<ThreadId>,
    counters: QueueCounters,
}

/// Create a queue. `capacity` of `None` is unbounded; `Some(n)` blocks
/// producers while `n` commands are pending.
pub fn channel<S>(
    capacity: Option<usize>,
    console: Arc<dyn Console>,
) -> (Injector<S>, CommandQueue<S>) {
    let (tx, rx) = match capacity {
        Some(n) => crossbeam_channel::bounded(n),
        None => crossbeam_channel::unbounded(),
    };
    let shared = Arc::new(Shared::default());
    (
        Injector {
            tx,
            shared: Arc::clone(&shared),
        },
        CommandQueue {
            rx,
            shared,
            console,
        },
    )
}

// ── Injector ─────────────────────────────────────────────────────

/// Producer handle. Cheap to clone; one per handler thread is fine.
pub struct Injector<S> {
    tx: Sender<Command<S>>,
    shared: Arc<Shared>,
}

impl<S> Clone for Injector<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> std::fmt::Debug for Injector<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("pending", &self.tx.len())
            .field("stats", &self.shared.counters.snapshot())
            .finish()
    }
}

impl<S: 'static> Injector<S> {
    /// Queue `job` and return immediately.
    ///
    /// The caller observes no result. Faults inside `job` are contained
    /// and logged by the consumer. Fails only once the simulation thread
    /// has shut down.
    pub fn submit<F>(
        &self,
        label: impl Into<Cow<'static, str>>,
        job: F,
    ) -> Result<CommandSeq, InjectError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        let cmd = Command::new(self.next_seq(), label, job);
        self.enqueue(cmd)
    }

    /// Queue `job` and block until the simulation thread has finished
    /// running it.
    ///
    /// Returns [`InjectError::Faulted`] if `job` panicked; the caller is
    /// released either way.
    pub fn submit_and_wait<F>(
        &self,
        label: impl Into<Cow<'static, str>>,
        job: F,
    ) -> Result<(), InjectError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.call(label, job)
    }

    /// Like [`submit_and_wait`](Self::submit_and_wait), but hands the
    /// closure's return value back to the caller.
    ///
    /// Blocks only until this specific command completes, not until the
    /// whole queue drains.
    pub fn call<R, F>(&self, label: impl Into<Cow<'static, str>>, job: F) -> Result<R, InjectError>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        if self.is_consumer_thread() {
            return Err(InjectError::Reentrant);
        }

        let label = label.into();
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let (value_tx, value_rx) = crossbeam_channel::bounded(1);
        let cmd = Command::new(self.next_seq(), label.clone(), move |sim: &mut S| {
            let _ = value_tx.send(job(sim));
        })
        .with_completion(done_tx);

        self.enqueue(cmd)?;
        self.shared.counters.waited.fetch_add(1, Ordering::Relaxed);

        match done_rx.recv() {
            Ok(Completion::Completed) => value_rx.try_recv().map_err(|_| InjectError::Shutdown),
            Ok(Completion::Faulted { message }) => Err(InjectError::Faulted {
                label: label.into_owned(),
                message,
            }),
            // Completion sender dropped unsent: the command was discarded
            // with the queue.
            Err(_) => Err(InjectError::Shutdown),
        }
    }

    /// Whether the calling thread is the queue's consumer.
    pub fn is_consumer_thread(&self) -> bool {
        self.shared.consumer.get() == Some(&thread::current().id())
    }

    /// Commands currently waiting in the queue.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }

    /// Point-in-time queue counters.
    pub fn stats(&self) -> QueueStats {
        self.shared.counters.snapshot()
    }

    fn next_seq(&self) -> CommandSeq {
        CommandSeq(self.shared.next_seq.fetch_add(1, Ordering::Relaxed))
    }

    fn enqueue(&self, cmd: Command<S>) -> Result<CommandSeq, InjectError> {
        let seq = cmd.seq();
        // Counted before it becomes visible to the consumer, so
        // `executed` never overtakes `submitted`.
        self.shared.counters.submitted.fetch_add(1, Ordering::Release);
        match self.tx.send(cmd) {
            Ok(()) => {
                tracing::trace!(seq = seq.0, "command queued");
                Ok(seq)
            }
            Err(crossbeam_channel::SendError(cmd)) => {
                self.shared.counters.submitted.fetch_sub(1, Ordering::Release);
                cmd.abandon();
                Err(InjectError::Shutdown)
            }
        }
    }
}

// ── CommandQueue ─────────────────────────────────────────────────

/// Consumer side, owned by the simulation thread.
pub struct CommandQueue<S> {
    rx: Receiver<Command<S>>,
    shared: Arc<Shared>,
    console: Arc<dyn Console>,
}

impl<S> CommandQueue<S> {
    /// Register the calling thread as the consumer, so blocking
    /// submissions from it fail with [`InjectError::Reentrant`] instead
    /// of deadlocking. Only the first call has an effect.
    pub fn bind_current_thread(&self) {
        let _ = self.shared.consumer.set(thread::current().id());
    }

    /// Execute every command pending at the start of the call.
    ///
    /// Commands that arrive while draining wait for the next pass, so a
    /// steady stream of submissions cannot starve the caller's own work.
    /// Returns the number of commands executed.
    pub fn drain(&self, state: &mut S) -> usize {
        let pending = self.rx.len();
        let mut ran = 0;
        for _ in 0..pending {
            match self.rx.try_recv() {
                Ok(cmd) => {
                    self.run(cmd, state);
                    ran += 1;
                }
                Err(_) => break,
            }
        }
        ran
    }

    /// Block up to `timeout` for a command, then drain whatever else is
    /// pending. Returns the number of commands executed (0 on timeout).
    pub fn wait_and_drain(&self, state: &mut S, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(cmd) => {
                self.run(cmd, state);
                1 + self.drain(state)
            }
            Err(RecvTimeoutError::Timeout) => 0,
            Err(RecvTimeoutError::Disconnected) => {
                // No producers left; nothing can ever arrive.
                thread::sleep(timeout);
                0
            }
        }
    }

    /// Commands currently waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no command is waiting.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Point-in-time queue counters.
    pub fn stats(&self) -> QueueStats {
        self.shared.counters.snapshot()
    }

    fn run(&self, cmd: Command<S>, state: &mut S) {
        let seq = cmd.seq();
        let label = cmd.label().to_owned();
        let completion = cmd.execute(state);
        self.shared.counters.executed.fetch_add(1, Ordering::Release);
        match completion {
            Completion::Completed => {
                tracing::trace!(seq = seq.0, label = %label, "command executed");
            }
            Completion::Faulted { message } => {
                self.shared.counters.faulted.fetch_add(1, Ordering::Release);
                tracing::error!(seq = seq.0, label = %label, %message, "command faulted");
                self.console.log_output(&format!("{label}: {message}"));
            }
        }
    }
}

impl<S> std::fmt::Debug for CommandQueue<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("pending", &self.rx.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::TracingConsole;

    fn queue<S>() -> (Injector<S>, CommandQueue<S>) {
        channel(None, Arc::new(TracingConsole))
    }

    #[test]
    fn submit_then_drain_runs_in_order() {
        let (inj, q) = queue::<Vec<u32>>();
        for i in 0..5 {
            inj.submit("push", move |v: &mut Vec<u32>| v.push(i)).unwrap();
        }
        let mut state = Vec::new();
        assert_eq!(q.drain(&mut state), 5);
        assert_eq!(state, vec![0, 1, 2, 3, 4]);
        assert!(q.is_empty());
    }

    #[test]
    fn sequence_numbers_are_unique_and_increasing() {
        let (inj, _q) = queue::<()>();
        let a = inj.submit("a", |_| {}).unwrap();
        let b = inj.clone().submit("b", |_| {}).unwrap();
        assert!(b > a);
    }

    #[test]
    fn drain_only_takes_what_was_pending() {
        let (inj, q) = queue::<u32>();
        let inner = inj.clone();
        inj.submit("requeue", move |n: &mut u32| {
            *n += 1;
            inner.submit("later", |n: &mut u32| *n += 10).unwrap();
        })
        .unwrap();

        let mut n = 0;
        assert_eq!(q.drain(&mut n), 1);
        assert_eq!(n, 1);
        assert_eq!(q.len(), 1);
        assert_eq!(q.drain(&mut n), 1);
        assert_eq!(n, 11);
    }

    #[test]
    fn faulting_command_does_not_stop_drain() {
        let (inj, q) = queue::<Vec<&'static str>>();
        inj.submit("first", |v: &mut Vec<&'static str>| v.push("first"))
            .unwrap();
        inj.submit("boom", |_: &mut Vec<&'static str>| panic!("injected fault"))
            .unwrap();
        inj.submit("third", |v: &mut Vec<&'static str>| v.push("third"))
            .unwrap();

        let mut state = Vec::new();
        assert_eq!(q.drain(&mut state), 3);
        assert_eq!(state, vec!["first", "third"]);
        let stats = q.stats();
        assert_eq!(stats.executed, 3);
        assert_eq!(stats.faulted, 1);
    }

    #[test]
    fn call_on_consumer_thread_is_reentrant_error() {
        let (inj, q) = queue::<u32>();
        q.bind_current_thread();
        assert!(inj.is_consumer_thread());
        assert_eq!(inj.call("self", |n: &mut u32| *n), Err(InjectError::Reentrant));
        assert_eq!(inj.stats().submitted, 0);
    }

    #[test]
    fn call_returns_value_from_consumer() {
        let (inj, q) = queue::<u32>();
        let consumer = thread::spawn(move || {
            q.bind_current_thread();
            let mut n = 41;
            while q.wait_and_drain(&mut n, Duration::from_millis(5)) == 0 {}
            n
        });
        let got = inj
            .call("read", |n: &mut u32| {
                *n += 1;
                *n * 2
            })
            .unwrap();
        assert_eq!(got, 84);
        assert_eq!(consumer.join().unwrap(), 42);
        assert_eq!(inj.stats().waited, 1);
    }

    #[test]
    fn submit_after_consumer_dropped_reports_shutdown() {
        let (inj, q) = queue::<()>();
        drop(q);
        assert_eq!(inj.submit("late", |_| {}), Err(InjectError::Shutdown));
        assert_eq!(inj.submit_and_wait("late", |_| {}), Err(InjectError::Shutdown));
        assert_eq!(inj.stats().submitted, 0);
    }

    #[test]
    fn command_is_counted_before_it_can_run() {
        const N: usize = 200;
        let (inj, q) = queue::<Vec<u64>>();
        let consumer = thread::spawn(move || {
            let mut seen = Vec::new();
            let mut ran = 0;
            while ran < N {
                ran += q.wait_and_drain(&mut seen, Duration::from_millis(5));
            }
            seen
        });
        for _ in 0..N {
            let counters = inj.clone();
            inj.submit("count", move |seen: &mut Vec<u64>| {
                seen.push(counters.stats().in_flight());
            })
            .unwrap();
        }
        let seen = consumer.join().unwrap();
        assert_eq!(seen.len(), N);
        assert!(seen.iter().all(|&n| n >= 1), "running command not in flight");
    }

    #[test]
    fn waiter_released_when_queue_dropped_with_pending_command() {
        let (inj, q) = queue::<()>();
        let waiter = thread::spawn(move || inj.submit_and_wait("orphan", |_| {}));
        // Let the waiter enqueue, then tear the queue down without draining.
        while q.is_empty() {
            thread::yield_now();
        }
        drop(q);
        assert_eq!(waiter.join().unwrap(), Err(InjectError::Shutdown));
    }

    #[test]
    fn bounded_queue_applies_backpressure() {
        let (inj, q) = channel::<u32>(Some(1), Arc::new(TracingConsole));
        inj.submit("one", |n: &mut u32| *n += 1).unwrap();
        let producer = {
            let inj = inj.clone();
            thread::spawn(move || inj.submit("two", |n: &mut u32| *n += 1).is_ok())
        };
        thread::sleep(Duration::from_millis(20));
        assert_eq!(q.len(), 1, "second submit must block while full");

        let mut n = 0;
        q.drain(&mut n);
        assert!(producer.join().unwrap());
        q.drain(&mut n);
        assert_eq!(n, 2);
    }
}
