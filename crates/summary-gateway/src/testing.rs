//! Scripted dependency clients for tests.
//!
//! Enabled for this crate's unit tests and, through the `test-utils`
//! feature, for the workspace integration tests.

use crate::domain::deadline::Deadline;
use crate::domain::error::DependencyError;
use crate::domain::types::{AccessPayload, ContextItem, ContextPayload, IdentityPayload};
use crate::ports::{AccessClient, Clock, ContextClient, IdentityClient};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A client that answers every call with the same canned result after a
/// fixed delay.
///
/// By default the delay ignores the deadline, like a backend that does not
/// honour cancellation; [`Scripted::honoring_deadline`] bounds it instead.
#[derive(Debug)]
pub struct Scripted<T> {
    delay: Duration,
    result: Result<T, DependencyError>,
    honor_deadline: bool,
    calls: AtomicUsize,
}

impl<T: Clone + Send + Sync> Scripted<T> {
    pub fn ok(payload: T) -> Self {
        Self::with_result(Ok(payload))
    }

    pub fn err(error: DependencyError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<T, DependencyError>) -> Self {
        Self {
            delay: Duration::ZERO,
            result,
            honor_deadline: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Respond after `delay`.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Stop waiting as soon as the call's deadline fires.
    pub fn honoring_deadline(mut self) -> Self {
        self.honor_deadline = true;
        self
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn respond(&self, deadline: &Deadline) -> Result<T, DependencyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let work = async {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone()
        };
        if self.honor_deadline {
            deadline.run(work).await
        } else {
            work.await
        }
    }
}

#[async_trait]
impl IdentityClient for Scripted<IdentityPayload> {
    async fn get_user(
        &self,
        deadline: &Deadline,
        _user_id: &str,
    ) -> Result<IdentityPayload, DependencyError> {
        self.respond(deadline).await
    }
}

#[async_trait]
impl AccessClient for Scripted<AccessPayload> {
    async fn check_access(
        &self,
        deadline: &Deadline,
        _user_id: &str,
        _chat_id: &str,
    ) -> Result<AccessPayload, DependencyError> {
        self.respond(deadline).await
    }
}

#[async_trait]
impl ContextClient for Scripted<ContextPayload> {
    async fn get_context(
        &self,
        deadline: &Deadline,
        _chat_id: &str,
    ) -> Result<ContextPayload, DependencyError> {
        self.respond(deadline).await
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// 2024-01-01T00:00:00Z
    pub fn epoch() -> Self {
        Self(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn identity_for(user_id: &str) -> IdentityPayload {
    IdentityPayload {
        user_id: user_id.to_string(),
        username: format!("{}_name", user_id),
        email: format!("{}@example.com", user_id),
        role: "member".to_string(),
    }
}

pub fn access_granted() -> AccessPayload {
    AccessPayload {
        allowed: true,
        permissions: vec!["chat:read".to_string(), "chat:summary:view".to_string()],
        reason: "member of chat".to_string(),
    }
}

pub fn context_items(count: usize) -> ContextPayload {
    ContextPayload {
        items: (0..count)
            .map(|i| ContextItem {
                content: format!("message {}", i),
                score: 1.0 - i as f32 * 0.1,
            })
            .collect(),
        total_count: count as u32,
    }
}
