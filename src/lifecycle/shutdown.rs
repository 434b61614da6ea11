//! Shutdown coordination for the relay.
//!
//! One [`Shutdown`] is created at startup and cloned into everything that
//! must stop accepting work. Triggering is idempotent; once triggered,
//! [`Shutdown::drain`] bounds how long in-flight work may keep running.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

/// How a bounded drain ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Drain<T> {
    Finished(T),
    Abandoned,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("shutdown triggered");
        }
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once [`trigger`](Self::trigger) has been called on any clone.
    pub async fn triggered(&self) {
        self.token.cancelled().await
    }

    /// Wait at most `grace` for `work`, dropping it if the window closes.
    pub async fn drain<F>(&self, grace: Duration, work: F) -> Drain<F::Output>
    where
        F: Future,
    {
        match tokio::time::timeout(grace, work).await {
            Ok(output) => Drain::Finished(output),
            Err(_) => {
                tracing::warn!(
                    grace_secs = grace.as_secs(),
                    "Drain window elapsed, abandoning in-flight requests"
                );
                Drain::Abandoned
            }
        }
    }
}
