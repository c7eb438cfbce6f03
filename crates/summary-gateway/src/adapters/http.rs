//! JSON-over-HTTP backend clients.
//!
//! Every call runs under the shared deadline narrowed to the backend's own
//! budget, so a slow backend is cut off at the earlier of the two.

use crate::domain::deadline::Deadline;
use crate::domain::error::{DependencyError, GatewayError};
use crate::domain::types::{AccessPayload, ContextPayload, IdentityPayload};
use crate::ports::{AccessClient, ContextClient, IdentityClient};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::trace;

/// Longest error body kept in a [`DependencyError::Status`].
const MAX_ERROR_BODY: usize = 256;

/// One backend base URL plus its per-call budget.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(client: Client, base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let base = Url::parse(base_url)
            .map_err(|e| GatewayError::Client(format!("invalid backend url {}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(GatewayError::Client(format!(
                "backend url {} cannot carry a path",
                base_url
            )));
        }
        Ok(Self {
            client,
            base,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Base URL extended with percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send `request` and decode a JSON body, bounded by the narrowed
    /// deadline.
    async fn fetch<T: DeserializeOwned>(
        &self,
        deadline: &Deadline,
        request: RequestBuilder,
    ) -> Result<T, DependencyError> {
        let call_deadline = deadline.narrowed(self.timeout);
        call_deadline
            .run(async move {
                let response = request
                    .send()
                    .await
                    .map_err(|e| DependencyError::Transport(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(DependencyError::Status {
                        status: status.as_u16(),
                        body: body.chars().take(MAX_ERROR_BODY).collect(),
                    });
                }

                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| DependencyError::Transport(e.to_string()))?;
                serde_json::from_slice(&bytes).map_err(|e| DependencyError::Decode(e.to_string()))
            })
            .await
    }
}

/// `GET {base}/users/{user_id}`
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    backend: HttpBackend,
}

impl HttpIdentityClient {
    pub fn new(backend: HttpBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl IdentityClient for HttpIdentityClient {
    async fn get_user(
        &self,
        deadline: &Deadline,
        user_id: &str,
    ) -> Result<IdentityPayload, DependencyError> {
        let url = self.backend.endpoint(&["users", user_id]);
        trace!(url = %url, "Fetching user");
        let request = self.backend.client.get(url);
        self.backend.fetch(deadline, request).await
    }
}

#[derive(Debug, Serialize)]
struct AccessCheckRequest<'a> {
    user_id: &'a str,
    resource_id: &'a str,
    action: &'static str,
}

/// `POST {base}/access/check`
#[derive(Debug, Clone)]
pub struct HttpAccessClient {
    backend: HttpBackend,
}

impl HttpAccessClient {
    pub fn new(backend: HttpBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl AccessClient for HttpAccessClient {
    async fn check_access(
        &self,
        deadline: &Deadline,
        user_id: &str,
        chat_id: &str,
    ) -> Result<AccessPayload, DependencyError> {
        let url = self.backend.endpoint(&["access", "check"]);
        trace!(url = %url, "Checking access");
        let request = self.backend.client.post(url).json(&AccessCheckRequest {
            user_id,
            resource_id: chat_id,
            action: "read",
        });
        self.backend.fetch(deadline, request).await
    }
}

/// `GET {base}/chats/{chat_id}/context?limit={limit}`
#[derive(Debug, Clone)]
pub struct HttpContextClient {
    backend: HttpBackend,
    limit: u32,
}

impl HttpContextClient {
    pub fn new(backend: HttpBackend, limit: u32) -> Self {
        Self { backend, limit }
    }
}

#[async_trait]
impl ContextClient for HttpContextClient {
    async fn get_context(
        &self,
        deadline: &Deadline,
        chat_id: &str,
    ) -> Result<ContextPayload, DependencyError> {
        let mut url = self.backend.endpoint(&["chats", chat_id, "context"]);
        url.query_pairs_mut()
            .append_pair("limit", &self.limit.to_string());
        trace!(url = %url, "Fetching context");
        let request = self.backend.client.get(url);
        self.backend.fetch(deadline, request).await
    }
}
