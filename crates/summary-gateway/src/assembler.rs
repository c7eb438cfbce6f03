//! Response assembler.
//!
//! Maps an aggregation outcome to a status code and JSON body. The body is
//! encoded into a buffer before any response is built, so an encoding
//! failure becomes a plain 500 and never a partially written 200.

use crate::domain::error::{AggregationFailure, ApiError};
use crate::domain::types::{AccessPayload, AggregationResult, ContextPayload, IdentityPayload};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Body of a successful chat-summary response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummaryResponse {
    pub user: IdentityPayload,
    pub permissions: AccessPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextPayload>,
    pub degraded: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<AggregationResult> for ChatSummaryResponse {
    fn from(result: AggregationResult) -> Self {
        Self {
            user: result.identity,
            permissions: result.access,
            context: result.context,
            degraded: result.degraded,
            timestamp: result.completed_at,
        }
    }
}

/// Format one aggregation outcome: 200 with the summary, or 500 naming the
/// failed dependency or budget.
pub fn format(outcome: Result<AggregationResult, AggregationFailure>) -> Response {
    match outcome {
        Ok(result) => json_response(StatusCode::OK, &ChatSummaryResponse::from(result)),
        Err(failure) => ApiError::from(failure).into_response(),
    }
}

/// Encode `body` fully, then build the response.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = (status, bytes).into_response();
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            response
        }
        Err(e) => {
            error!(error = %e, "Failed to encode response body");
            ApiError::internal("failed to encode response").into_response()
        }
    }
}
