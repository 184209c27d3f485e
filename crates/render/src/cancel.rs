//! Cooperative cancellation for background rendering.
//!
//! The background phase has no natural teardown of its own; the embedder
//! holds a clone of the token and cancels it when the viewer goes away,
//! and the page sequence stops at the next page boundary.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared cancellation flag. All clones observe a `cancel()` on any of
/// them; cancelling is idempotent.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
