//! Apply context and caller-supplied hooks
//!
//! These let the declarative crate be used without depending on a specific
//! terminal UI or signal handling implementation.

use crate::types::ApplyResult;
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation signal shared between the caller and operations
///
/// Operations check the token before every remote call. A call that has
/// already been issued runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every operation holding this token
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback: Send + Sync {
    /// Called when starting to apply a single resource
    fn on_resource_start(&self, id: &str, description: &str);

    /// Called when a resource application completes
    fn on_resource_complete(&self, id: &str, result: &ApplyResult);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action
    ///
    /// Returns `true` if the user confirmed.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_resource_start(&self, _id: &str, _description: &str) {}
    fn on_resource_complete(&self, _id: &str, _result: &ApplyResult) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Context passed to resource lifecycle operations
#[derive(Debug, Clone, Default)]
pub struct ApplyContext {
    /// Whether this is a dry run (no actual changes)
    pub dry_run: bool,
    /// Whether to output verbose information
    pub verbose: bool,
    /// Cancellation signal honoured before each remote call
    pub cancel: CancelToken,
}

impl ApplyContext {
    /// Create a new apply context with a fresh cancellation token
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Self {
            dry_run,
            verbose,
            cancel: CancelToken::new(),
        }
    }

    /// Create a context sharing an existing cancellation token
    pub fn with_cancel(dry_run: bool, verbose: bool, cancel: CancelToken) -> Self {
        Self {
            dry_run,
            verbose,
            cancel,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let ctx = ApplyContext::with_cancel(false, false, token.clone());
        assert!(!ctx.is_cancelled());

        token.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_fresh_contexts_are_independent() {
        let a = ApplyContext::new(false, false);
        let b = ApplyContext::new(true, false);
        a.cancel.cancel();
        assert!(!b.is_cancelled());
        assert!(b.dry_run);
    }

    #[test]
    fn test_confirm_callbacks() {
        assert!(AutoConfirm.confirm("go?").unwrap());
        assert!(!AutoDecline.confirm("go?").unwrap());
    }
}
