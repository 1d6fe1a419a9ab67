//! Cache-breaker counter for rendered artifacts.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter bumped on every externally observed mutation.
///
/// Its value is embedded in generated resource identifiers so a cached
/// artifact from before a mutation is never served after it. Never
/// decremented and never reset during a run; u64 overflow is not
/// handled.
#[derive(Debug, Default)]
pub struct CacheBreaker {
    value: AtomicU64,
}

// Compile-time assertion: CacheBreaker must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<CacheBreaker>();
};

impl CacheBreaker {
    /// Start at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the new value.
    pub fn bump(&self) -> u64 {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Current value.
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }
}
