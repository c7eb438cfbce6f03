//! Aggregation data model.
//!
//! Every value here lives for exactly one aggregation run: it is created when
//! the request is admitted and dropped when the response has been written.

use crate::domain::error::{DependencyError, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated identifiers for one chat-summary run.
///
/// Both fields are non-empty; construction through [`AggregationRequest::new`]
/// is the only way to obtain one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationRequest {
    user_id: String,
    chat_id: String,
}

impl AggregationRequest {
    /// Validate the two required identifiers.
    ///
    /// Empty values count as missing. When both are missing the error names
    /// both fields.
    pub fn new(
        user_id: Option<impl Into<String>>,
        chat_id: Option<impl Into<String>>,
    ) -> Result<Self, ValidationError> {
        let user_id = user_id.map(Into::into).filter(|v| !v.is_empty());
        let chat_id = chat_id.map(Into::into).filter(|v| !v.is_empty());

        match (user_id, chat_id) {
            (Some(user_id), Some(chat_id)) => Ok(Self { user_id, chat_id }),
            (None, None) => Err(ValidationError::MissingFields(vec!["user_id", "chat_id"])),
            (None, Some(_)) => Err(ValidationError::MissingFields(vec!["user_id"])),
            (Some(_), None) => Err(ValidationError::MissingFields(vec!["chat_id"])),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

/// The three backends a chat summary is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependency {
    /// User profile lookup (critical)
    Identity,
    /// Chat access check (critical)
    Access,
    /// Conversation context lookup (optional)
    Context,
}

impl Dependency {
    pub const ALL: [Dependency; 3] = [Dependency::Identity, Dependency::Access, Dependency::Context];

    /// Whether a failure of this dependency invalidates the whole run.
    pub fn is_critical(self) -> bool {
        matches!(self, Dependency::Identity | Dependency::Access)
    }

    /// Stable lowercase name used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Dependency::Identity => "identity",
            Dependency::Access => "access",
            Dependency::Context => "context",
        }
    }

    /// Human-facing backend name used in failure messages.
    pub fn service_name(self) -> &'static str {
        match self {
            Dependency::Identity => "identity service",
            Dependency::Access => "access service",
            Dependency::Context => "context service",
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User profile returned by the identity backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPayload {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

/// Access decision returned by the access backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPayload {
    pub allowed: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub reason: String,
}

/// One retrieved context fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub content: String,
    #[serde(default)]
    pub score: f32,
}

/// Conversation context returned by the context backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextPayload {
    #[serde(default)]
    pub items: Vec<ContextItem>,
    #[serde(default)]
    pub total_count: u32,
}

/// Typed payload carried by a successful outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum DependencyPayload {
    Identity(IdentityPayload),
    Access(AccessPayload),
    Context(ContextPayload),
}

/// Result of exactly one dependency call, handed from its task to the
/// collection point.
#[derive(Debug)]
pub struct DependencyOutcome {
    pub dependency: Dependency,
    pub result: Result<DependencyPayload, DependencyError>,
}

impl DependencyOutcome {
    pub fn identity(result: Result<IdentityPayload, DependencyError>) -> Self {
        Self {
            dependency: Dependency::Identity,
            result: result.map(DependencyPayload::Identity),
        }
    }

    pub fn access(result: Result<AccessPayload, DependencyError>) -> Self {
        Self {
            dependency: Dependency::Access,
            result: result.map(DependencyPayload::Access),
        }
    }

    pub fn context(result: Result<ContextPayload, DependencyError>) -> Self {
        Self {
            dependency: Dependency::Context,
            result: result.map(DependencyPayload::Context),
        }
    }
}

/// Successful aggregation.
///
/// `context` is present only when the optional dependency delivered before
/// the deadline, and `degraded` is true exactly when it is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    pub identity: IdentityPayload,
    pub access: AccessPayload,
    pub context: Option<ContextPayload>,
    pub degraded: bool,
    pub completed_at: DateTime<Utc>,
}
