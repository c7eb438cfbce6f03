//! Outbound ports for the gateway.
//!
//! Each backend is reached through one call that takes the shared
//! [`Deadline`] and returns a typed payload or a [`DependencyError`].
//! Implementations must surface every failure, including their own
//! timeouts; deciding what a failure means is the aggregator's job.

use crate::domain::deadline::Deadline;
use crate::domain::error::DependencyError;
use crate::domain::types::{AccessPayload, ContextPayload, IdentityPayload};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// User profile lookup (critical).
#[async_trait]
pub trait IdentityClient: Send + Sync {
    async fn get_user(
        &self,
        deadline: &Deadline,
        user_id: &str,
    ) -> Result<IdentityPayload, DependencyError>;
}

/// Chat access check (critical).
#[async_trait]
pub trait AccessClient: Send + Sync {
    async fn check_access(
        &self,
        deadline: &Deadline,
        user_id: &str,
        chat_id: &str,
    ) -> Result<AccessPayload, DependencyError>;
}

/// Conversation context lookup (optional).
#[async_trait]
pub trait ContextClient: Send + Sync {
    async fn get_context(
        &self,
        deadline: &Deadline,
        chat_id: &str,
    ) -> Result<ContextPayload, DependencyError>;
}

/// Time source trait for testability
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// System time implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
