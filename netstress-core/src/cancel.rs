//! Shared cancellation token
//!
//! All long-running interceptor workers hold a clone of the same token and
//! poll it cooperatively. The transition is monotonic: once tripped, never
//! unset for the lifetime of the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// First-writer-wins abort token shared across worker threads.
#[derive(Debug, Clone, Default)]
pub struct AbortToken(Arc<AtomicBool>);

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the token. Returns true only for the first caller.
    pub fn trip(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Has the token been tripped?
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
