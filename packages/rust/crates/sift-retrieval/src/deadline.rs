//! Request-level deadline shared by every downstream call of one request.

use std::time::Duration;

use tokio::time::Instant;

/// Optional absolute deadline. Step timeouts are clamped to what remains of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestDeadline {
    at: Option<Instant>,
}

impl RequestDeadline {
    /// No request-level deadline; only per-step budgets apply.
    #[must_use]
    pub const fn none() -> Self {
        Self { at: None }
    }

    /// Deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Some(Instant::now() + budget),
        }
    }

    /// Deadline at an absolute instant.
    #[must_use]
    pub const fn at(instant: Instant) -> Self {
        Self { at: Some(instant) }
    }

    /// Time left, or `None` when unbounded.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// True once the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }

    /// Effective budget for one step: `min(step, remaining)`.
    #[must_use]
    pub fn clamp(&self, step: Duration) -> Duration {
        match self.remaining() {
            Some(left) => step.min(left),
            None => step,
        }
    }
}
