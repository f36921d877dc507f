//! Cooperative cancellation for long-running paths.
//!
//! The solver polls the token exactly once per outer minimization
//! iteration, after the update and fusion steps have completed, so the
//! observable clustering state is always consistent when a cancellation
//! is honored. There is no interrupt machinery beyond this single
//! check-point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shareable cancellation flag.
///
/// Clone the token and hand one copy to the thread driving the path;
/// calling [`CancelToken::cancel`] from anywhere makes the solver stop
/// at its next check-point, discarding only the in-flight probe and
/// preserving every already-recorded result.
///
/// # Example
///
/// ```
/// use clusterpath_core::CancelToken;
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
