//! Cooperative cancellation and run deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cloneable cancellation flag shared with a signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Time budget of one run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunBudget {
    deadline: Option<Instant>,
}

impl RunBudget {
    pub(crate) fn new(timeout: Option<Duration>) -> Self {
        Self { deadline: timeout.map(|t| Instant::now() + t) }
    }

    pub(crate) fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Remaining budget split evenly over `remaining` subscribers.
    pub(crate) fn per_target(&self, remaining: usize) -> Option<Duration> {
        let left = self.deadline?.saturating_duration_since(Instant::now());
        let share = left / u32::try_from(remaining.max(1)).unwrap_or(u32::MAX);
        Some(share.max(Duration::from_millis(1)))
    }
}

/// Why a subscriber was never attempted, if it wasn't.
pub(crate) fn stop_reason(cancel: &CancelToken, budget: &RunBudget) -> Option<&'static str> {
    if cancel.is_cancelled() {
        Some("not attempted: run cancelled")
    } else if budget.expired() {
        Some("not attempted: run deadline exceeded")
    } else {
        None
    }
}
