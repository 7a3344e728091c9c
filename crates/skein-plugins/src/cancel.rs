//! Cooperative cancellation shared between the CLI and long-running fetches.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cancellation signal plus an optional deadline.
///
/// Clones share the same flag. The CLI registers the flag with its signal
/// handlers; fetchers poll [`CancelToken::is_cancelled`] and
/// [`CancelToken::deadline_passed`] while waiting on child processes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Deadline>,
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    budget: Duration,
}

impl CancelToken {
    /// Creates a token that is never cancelled until [`CancelToken::cancel`]
    /// is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a token sharing this flag that also expires after `budget`.
    ///
    /// A budget too large to represent as an instant never expires.
    #[must_use]
    pub fn with_timeout(&self, budget: Duration) -> Self {
        Self {
            flag: Arc::clone(&self.flag),
            deadline: Instant::now()
                .checked_add(budget)
                .map(|at| Deadline { at, budget }),
        }
    }

    /// The shared flag, for registration with signal handlers.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Returns the configured budget when the deadline has passed.
    #[must_use]
    pub fn deadline_passed(&self) -> Option<Duration> {
        self.deadline
            .filter(|deadline| Instant::now() >= deadline.at)
            .map(|deadline| deadline.budget)
    }
}
