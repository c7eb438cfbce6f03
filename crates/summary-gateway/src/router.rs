//! HTTP surface: chat summary, health and metrics endpoints.

use crate::aggregator::Aggregator;
use crate::assembler;
use crate::domain::deadline::Deadline;
use crate::domain::error::ApiError;
use crate::domain::types::AggregationRequest;
use crate::middleware::{AggregationTimer, GatewayMetrics, TimeoutLayer, TracingLayer};
use crate::ports::Clock;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::Method,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::SecondsFormat;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tracing::{debug, warn};

/// Path of the aggregation endpoint.
pub const SUMMARY_PATH: &str = "/api/v1/chat/summary";

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
    /// Budget of the shared deadline armed per request
    pub sla: Duration,
    pub metrics: Arc<GatewayMetrics>,
    pub clock: Arc<dyn Clock>,
}

/// Build the router with its middleware stack.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TracingLayer::new())
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .route(
            SUMMARY_PATH,
            get(chat_summary).fallback(method_not_allowed),
        )
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .layer(middleware)
        .with_state(state)
}

#[derive(Debug, Default)]
struct SummaryQuery {
    user_id: Option<String>,
    chat_id: Option<String>,
}

impl SummaryQuery {
    /// First value wins for a repeated key; unknown keys are ignored.
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "user_id" => &mut query.user_id,
                "chat_id" => &mut query.chat_id,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

/// `GET /api/v1/chat/summary?user_id=..&chat_id=..`
async fn chat_summary(
    State(state): State<AppState>,
    method: Method,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    // The GET route also matches HEAD
    if method == Method::HEAD {
        return method_not_allowed(State(state), method).await;
    }

    let query = match pairs {
        Ok(Query(pairs)) => SummaryQuery::from_pairs(pairs),
        Err(rejection) => {
            debug!(error = %rejection, "Undecodable query string");
            SummaryQuery::default()
        }
    };

    let request = match AggregationRequest::new(query.user_id, query.chat_id) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected chat summary request");
            state.metrics.record_rejected();
            return ApiError::from(e).into_response();
        }
    };

    let deadline = Deadline::after(state.sla);
    // Releases outstanding dependency calls once the response is decided,
    // or when this future is dropped by the timeout layer.
    let _guard = deadline.guard();

    let timer = AggregationTimer::start(Arc::clone(&state.metrics));
    let outcome = state.aggregator.aggregate(&request, &deadline).await;
    match &outcome {
        Ok(result) => timer.succeeded(result.degraded),
        Err(failure) => timer.failed(failure.cause),
    }

    assembler::format(outcome)
}

async fn method_not_allowed(State(state): State<AppState>, method: Method) -> Response {
    state.metrics.record_method_rejected();
    ApiError::method_not_allowed(method.as_str()).into_response()
}

async fn not_found() -> Response {
    ApiError::new(axum::http::StatusCode::NOT_FOUND, "no such endpoint").into_response()
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": state.clock.now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.to_json())
}
