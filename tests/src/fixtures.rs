//! Gateway harness over scripted backends.
//!
//! Every scenario goes through the real router, middleware included, with
//! a 200ms shared deadline and a pinned clock.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use summary_gateway::domain::Deadline;
use summary_gateway::ports::IdentityClient;
use summary_gateway::router::{build_router, AppState};
use summary_gateway::testing::FixedClock;
use summary_gateway::{
    Aggregator, DependencyClients, DependencyError, GatewayMetrics, IdentityPayload,
};
use tower::ServiceExt;

pub use summary_gateway::testing::{access_granted, context_items, identity_for, Scripted};

/// Shared deadline used by every scenario.
pub const SLA: Duration = Duration::from_millis(200);

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Router wired to the given clients, plus its metrics.
pub struct Gateway {
    pub router: Router,
    pub metrics: Arc<GatewayMetrics>,
}

impl Gateway {
    pub fn new(clients: DependencyClients) -> Self {
        let clock = Arc::new(FixedClock::epoch());
        let metrics = Arc::new(GatewayMetrics::new());
        let state = AppState {
            aggregator: Aggregator::new(clients).with_clock(clock.clone()),
            sla: SLA,
            metrics: Arc::clone(&metrics),
            clock,
        };
        Self {
            router: build_router(state, Duration::from_secs(5)),
            metrics,
        }
    }

    pub fn scripted(
        identity: Scripted<IdentityPayload>,
        access: Scripted<summary_gateway::AccessPayload>,
        context: Scripted<summary_gateway::ContextPayload>,
    ) -> Self {
        Self::new(DependencyClients {
            identity: Arc::new(identity),
            access: Arc::new(access),
            context: Arc::new(context),
        })
    }

    /// `GET /api/v1/chat/summary` for the given ids.
    pub async fn summary(&self, user_id: &str, chat_id: &str) -> Reply {
        self.send(
            Method::GET,
            &format!(
                "/api/v1/chat/summary?user_id={}&chat_id={}",
                user_id, chat_id
            ),
        )
        .await
    }

    pub async fn send(&self, method: Method, uri: &str) -> Reply {
        let started = tokio::time::Instant::now();
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("infallible router");
        let elapsed = started.elapsed();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };

        Reply {
            status,
            headers,
            body,
            elapsed,
        }
    }
}

/// One finished HTTP exchange.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
    pub elapsed: Duration,
}

impl Reply {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

/// Identity backend that answers for whichever user it is asked about.
#[derive(Debug, Clone, Copy)]
pub struct EchoIdentity {
    pub delay: Duration,
}

#[async_trait]
impl IdentityClient for EchoIdentity {
    async fn get_user(
        &self,
        _deadline: &Deadline,
        user_id: &str,
    ) -> Result<IdentityPayload, DependencyError> {
        tokio::time::sleep(self.delay).await;
        Ok(identity_for(user_id))
    }
}
