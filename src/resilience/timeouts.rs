//! Timeout enforcement.
//!
//! # Responsibilities
//! - Represent a stage budget as an explicit [`Deadline`] value
//! - Wrap stage calls so they cannot outlive their own budget
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities (`timeout_at`), so paused-clock tests work
//! - Timeout errors are distinct from other errors
//! - A deadline is fixed when created; it is never derived from a caller's

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Returned when a future does not complete before its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {budget:?} exceeded")]
pub struct DeadlineExceeded {
    pub budget: Duration,
}

/// A point in time by which one operation must finish.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    budget: Duration,
    expires_at: Instant,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            budget,
            expires_at: Instant::now() + budget,
        }
    }

    /// The budget this deadline was created with.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Drive `fut` until it completes or the deadline passes. On expiry the
    /// future is dropped.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, DeadlineExceeded>
    where
        F: Future,
    {
        tokio::time::timeout_at(self.expires_at, fut)
            .await
            .map_err(|_| DeadlineExceeded {
                budget: self.budget,
            })
    }
}
