//! The shared primitives handed to request handlers.

use std::sync::Arc;

use tether_core::ControlGate;

use crate::busy::{BusyState, DetachedGate};
use crate::cache::CacheBreaker;
use crate::heartbeat::Heartbeat;

/// Heartbeat, busy state and cache breaker, bundled for cloning into
/// handlers. Each is independently synchronized; holding a `Signals`
/// implies no lock.
#[derive(Clone, Debug)]
pub struct Signals {
    /// Monitor liveness.
    pub heartbeat: Arc<Heartbeat>,
    /// Busy/idle gate.
    pub busy: Arc<BusyState>,
    /// Render cache invalidation.
    pub cache: Arc<CacheBreaker>,
}

impl Signals {
    /// Fresh primitives whose busy projection drives `gate`.
    pub fn new(gate: Arc<dyn ControlGate>) -> Self {
        let heartbeat = Arc::new(Heartbeat::new());
        Self {
            busy: Arc::new(BusyState::new(gate, Arc::clone(&heartbeat))),
            heartbeat,
            cache: Arc::new(CacheBreaker::new()),
        }
    }

    /// Fresh primitives with no control surface attached.
    pub fn detached() -> Self {
        Self::new(Arc::new(DetachedGate))
    }
}
