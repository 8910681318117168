//! Cancellation token for cooperative shutdown
//!
//! The listener and every worker hold a clone of the server's token and
//! check it at the top of their loops.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Token for checking and triggering cancellation
///
/// Cloning a token shares its state: cancelling any clone is observed by
/// all of them.
///
/// ```
/// use torero_core::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker_view = token.clone();
/// token.cancel();
/// assert!(worker_view.is_cancelled());
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, uncancelled token
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if cancellation was requested
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_basic_cancellation() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_clone_shares_state_across_threads() {
        let token = CancellationToken::new();
        let remote = token.clone();

        thread::spawn(move || remote.cancel())
            .join()
            .unwrap();

        assert!(token.is_cancelled());
    }
}
