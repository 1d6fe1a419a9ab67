//! Last-seen timestamp of the monitoring client.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Records when the monitor was last confirmed reachable.
///
/// Has its own lock, never held while any other lock is taken, so
/// high-frequency pings cannot queue behind simulation work. Disconnect
/// detection is left to the caller via [`since_last_seen`](Self::since_last_seen).
#[derive(Debug)]
pub struct Heartbeat {
    last_seen: Mutex<Instant>,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

// Compile-time assertion: Heartbeat must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Heartbeat>();
};

impl Heartbeat {
    /// Start with "seen now".
    pub fn new() -> Self {
        Self {
            last_seen: Mutex::new(Instant::now()),
        }
    }

    /// Record now as the last-seen instant.
    ///
    /// Never moves the timestamp backwards, even if two callers race
    /// between reading the clock and taking the lock.
    pub fn touch(&self) {
        let now = Instant::now();
        let mut last = self.last_seen.lock().unwrap_or_else(PoisonError::into_inner);
        if now > *last {
            *last = now;
        }
    }

    /// The last-seen instant.
    pub fn last_seen(&self) -> Instant {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Time elapsed since the last touch.
    pub fn since_last_seen(&self) -> Duration {
        self.last_seen().elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn touch_advances_last_seen() {
        let hb = Heartbeat::new();
        let before = hb.last_seen();
        thread::sleep(Duration::from_millis(2));
        hb.touch();
        assert!(hb.last_seen() > before);
        assert!(hb.since_last_seen() < Duration::from_secs(5));
    }

    #[test]
    fn concurrent_touches_stay_monotonic() {
        let hb = Arc::new(Heartbeat::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let hb = Arc::clone(&hb);
                thread::spawn(move || {
                    let mut prev = hb.last_seen();
                    for _ in 0..500 {
                        hb.touch();
                        let now = hb.last_seen();
                        assert!(now >= prev);
                        prev = now;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }
}
