//! Cooperative cancellation.
//!
//! The optimizer checks a shared flag at the top of every iteration and
//! inside every blocking wait, instead of relying on thread interruption.
//! Cancellation is advisory: in-flight objective evaluations are not torn
//! down, the control loop simply stops consuming their results.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable handle used to request that a running search stop.
///
/// All clones share one flag; any of them can cancel. The flag is
/// one-way: once cancelled, a token stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
