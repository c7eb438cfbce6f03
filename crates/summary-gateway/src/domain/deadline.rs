//! Shared, cancellable deadline for one aggregation run.
//!
//! A [`Deadline`] fires on whichever happens first: its expiry instant, or an
//! explicit cancellation. Clones share the same cancellation token, so every
//! dependency call and the aggregator's wait loop observe the same signal.

use crate::domain::error::DependencyError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// How a deadline fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fired {
    Expired,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct Deadline {
    expires_at: Instant,
    budget: Duration,
    token: CancellationToken,
}

impl Deadline {
    /// Arm a deadline that expires `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now() + budget,
            budget,
            token: CancellationToken::new(),
        }
    }

    /// Derive a tighter deadline for one dependency call.
    ///
    /// The result expires at the earlier of this deadline and `now + budget`,
    /// and is cancelled whenever this deadline is. Cancelling the derived
    /// deadline does not cancel its parent.
    pub fn narrowed(&self, budget: Duration) -> Self {
        let own = Instant::now() + budget;
        let (expires_at, budget) = if own < self.expires_at {
            (own, budget)
        } else {
            (self.expires_at, self.remaining())
        };
        Self {
            expires_at,
            budget,
            token: self.token.child_token(),
        }
    }

    /// Cancel now. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Guard that cancels this deadline when dropped.
    pub fn guard(&self) -> DeadlineGuard {
        DeadlineGuard {
            token: self.token.clone(),
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn has_fired(&self) -> bool {
        self.is_cancelled() || Instant::now() >= self.expires_at
    }

    /// Resolve once the deadline expires or is cancelled.
    pub async fn fired(&self) -> Fired {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Fired::Cancelled,
            _ = sleep_until(self.expires_at) => Fired::Expired,
        }
    }

    /// Run a dependency call bounded by this deadline.
    ///
    /// A call that completes on the same poll the deadline fires keeps its
    /// result.
    pub async fn run<T, F>(&self, call: F) -> Result<T, DependencyError>
    where
        F: Future<Output = Result<T, DependencyError>>,
    {
        tokio::select! {
            biased;
            result = call => result,
            fired = self.fired() => Err(match fired {
                Fired::Expired => DependencyError::Timeout { budget: self.budget },
                Fired::Cancelled => DependencyError::Cancelled,
            }),
        }
    }
}

/// Cancels the shared deadline on drop, releasing any dependency calls that
/// are still outstanding once a response has been decided.
#[derive(Debug)]
pub struct DeadlineGuard {
    token: CancellationToken,
}

impl Drop for DeadlineGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
