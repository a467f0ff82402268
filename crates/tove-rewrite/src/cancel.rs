//! Cooperative cancellation for long tree walks.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The operation observed a cancellation request and unwound.
///
/// Never swallowed: every tagging, recording, or resolution entry point
/// returns it to the caller instead of a partial answer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the operation was cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Shared cancellation signal.
///
/// The default token can never be cancelled and checking it is free; callers
/// needing bounded latency create one with [`CancellationToken::new`] and
/// keep a clone to [`cancel`](Self::cancel) from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Option<Arc<AtomicBool>>,
}

impl CancellationToken {
    /// Creates a cancellable token.
    pub fn new() -> Self {
        Self { flag: Some(Arc::new(AtomicBool::new(false))) }
    }

    /// Creates a token that can never be cancelled.
    pub fn none() -> Self {
        Self::default()
    }

    /// Requests cancellation; all clones of this token observe it.
    pub fn cancel(&self) {
        if let Some(flag) = &self.flag {
            flag.store(true, Ordering::Relaxed);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Returns an error if cancellation was requested.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() { Err(Cancelled) } else { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_visible_to_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert_eq!(clone.check(), Ok(()));

        token.cancel();
        assert_eq!(clone.check(), Err(Cancelled));
    }

    #[test]
    fn default_token_never_cancels() {
        let token = CancellationToken::none();
        token.cancel();
        assert_eq!(token.check(), Ok(()));
    }
}
