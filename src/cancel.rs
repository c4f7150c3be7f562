// src/cancel.rs

//! Cooperative cancellation token
//!
//! Planning is single-threaded but may walk large package trees through a
//! blocking filesystem adapter. Every pipeline stage checks the token at
//! entry; the scanner also checks before each directory read and each
//! recursive child, so cancellation takes effect without further adapter
//! calls.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag
///
/// Cloning shares the underlying flag; any clone can request cancellation
/// and all observers see it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Return `Error::Cancelled` naming the interrupted call site if
    /// cancellation has been requested
    pub fn check(&self, operation: &str) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled(operation.to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_passes_check() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check("scan").is_ok());
    }

    #[test]
    fn test_cancel_is_visible_to_clones() {
        let token = CancelToken::new();
        let observer = token.clone();
        token.cancel();

        assert!(observer.is_cancelled());
        match observer.check("resolve") {
            Err(Error::Cancelled(op)) => assert_eq!(op, "resolve"),
            other => panic!("expected cancellation, got {other:?}"),
        }
    }
}
