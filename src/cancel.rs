//! Cooperative cancellation for batch runs.
//!
//! The processor checks the token once per page. Front ends keep a clone and
//! call [`CancellationToken::cancel`] from another thread (the CLI does so on
//! Ctrl-C).

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared cancellation flag. Clones observe the same state.
///
/// ```
/// use pdf2anki::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker = token.clone();
/// token.cancel();
/// assert!(worker.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Clear the flag so the token can drive another run.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
