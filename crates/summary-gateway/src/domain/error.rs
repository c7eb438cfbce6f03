//! Gateway error types.
//!
//! Optional-dependency failures never leave the aggregator as errors; they
//! are converted into the `degraded` flag. Everything else surfaces to the
//! caller as an [`ApiError`] with a JSON body.

use crate::domain::types::Dependency;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Failure of a single dependency call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyError {
    /// The call's own budget (or the shared deadline) elapsed
    #[error("timed out after {}ms", .budget.as_millis())]
    Timeout { budget: Duration },

    /// The shared deadline was cancelled before the call returned
    #[error("call cancelled")]
    Cancelled,

    /// Connection or protocol failure before a response arrived
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Backend answered with a body that could not be decoded
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Backend is not reachable or refused to serve
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Why an aggregation run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    IdentityFailed,
    AccessFailed,
    CriticalTimeout,
}

impl FailureCause {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCause::IdentityFailed => "identity_failed",
            FailureCause::AccessFailed => "access_failed",
            FailureCause::CriticalTimeout => "critical_timeout",
        }
    }
}

/// Hard failure of an aggregation run.
///
/// Raised iff a critical dependency reported an error, or the shared deadline
/// fired before both critical dependencies completed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{detail}")]
pub struct AggregationFailure {
    pub cause: FailureCause,
    pub detail: String,
}

impl AggregationFailure {
    /// A critical dependency reported an error.
    ///
    /// Optional dependencies never fail a run; passing one here is a bug in
    /// the caller and is reported against identity so the run still fails.
    pub fn critical(dependency: Dependency, error: &DependencyError) -> Self {
        debug_assert!(dependency.is_critical());
        let cause = match dependency {
            Dependency::Access => FailureCause::AccessFailed,
            Dependency::Identity | Dependency::Context => FailureCause::IdentityFailed,
        };
        Self {
            cause,
            detail: format!("{} failed: {}", dependency.service_name(), error),
        }
    }

    /// A critical dependency's task ended without reporting an outcome.
    pub fn vanished(dependency: Dependency) -> Self {
        Self::critical(
            dependency,
            &DependencyError::Unavailable("task ended without reporting".into()),
        )
    }

    /// The shared deadline fired while critical dependencies were pending.
    pub fn critical_timeout(pending: &[Dependency], budget: Duration) -> Self {
        let names: Vec<&str> = pending.iter().map(|d| d.service_name()).collect();
        Self {
            cause: FailureCause::CriticalTimeout,
            detail: format!(
                "deadline of {}ms elapsed waiting for {}",
                budget.as_millis(),
                names.join(" and ")
            ),
        }
    }

    /// The shared deadline was cancelled while critical dependencies were
    /// pending, e.g. because the caller went away.
    pub fn cancelled(pending: &[Dependency]) -> Self {
        let names: Vec<&str> = pending.iter().map(|d| d.service_name()).collect();
        Self {
            cause: FailureCause::CriticalTimeout,
            detail: format!("deadline cancelled waiting for {}", names.join(" and ")),
        }
    }
}

/// Rejected inbound request, detected before the aggregator runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{}", missing_fields_message(.0))]
    MissingFields(Vec<&'static str>),
}

fn missing_fields_message(fields: &[&'static str]) -> String {
    let verb = if fields.len() > 1 { "are" } else { "is" };
    format!("{} {} required", fields.join(" and "), verb)
}

/// Error body written for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status text, e.g. "Bad Request"
    pub error: String,
    /// Numeric HTTP status, repeated in the body
    pub code: u16,
    /// Diagnostic naming the failing field, dependency or budget
    pub message: String,
}

/// HTTP-facing error: a status plus a diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn method_not_allowed(method: &str) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("method {} is not supported, use GET", method),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn gateway_timeout(limit: Duration) -> Self {
        Self::new(
            StatusCode::GATEWAY_TIMEOUT,
            format!("request exceeded {}ms timeout", limit.as_millis()),
        )
    }

    pub fn body(&self) -> ErrorResponse {
        ErrorResponse {
            error: self
                .status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            code: self.status.as_u16(),
            message: self.message.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::bad_request(e.to_string())
    }
}

impl From<AggregationFailure> for ApiError {
    fn from(e: AggregationFailure) -> Self {
        ApiError::internal(format!("Service unavailable: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let bytes = serde_json::to_vec(&self.body()).unwrap_or_default();

        let mut response = (self.status, bytes).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}

/// Gateway lifecycle errors (not surfaced over HTTP)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server loop terminated with an I/O error
    #[error("server error: {0}")]
    Serve(String),

    /// Backend client could not be built
    #[error("backend client error: {0}")]
    Client(String),
}
