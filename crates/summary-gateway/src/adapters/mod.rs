//! Concrete dependency clients.
//!
//! A backend with a configured URL is reached over HTTP; one without gets
//! its in-process stand-in.

pub mod fixed;
pub mod http;

pub use fixed::{FixedAccessClient, FixedContextClient, FixedIdentityClient};
pub use http::{HttpAccessClient, HttpBackend, HttpContextClient, HttpIdentityClient};

use crate::aggregator::DependencyClients;
use crate::domain::config::{BackendConfig, BackendsConfig};
use crate::domain::error::GatewayError;
use crate::ports::{AccessClient, ContextClient, IdentityClient};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Shared HTTP connection pool for all backends.
pub fn http_client(keep_alive: Duration) -> Result<Client, GatewayError> {
    Client::builder()
        .pool_idle_timeout(keep_alive)
        .tcp_nodelay(true)
        .build()
        .map_err(|e| GatewayError::Client(e.to_string()))
}

/// Build the three clients described by `config`.
pub fn build_clients(
    config: &BackendsConfig,
    client: &Client,
) -> Result<DependencyClients, GatewayError> {
    let resolve = |name: &str, backend: &BackendConfig| -> Result<Option<HttpBackend>, GatewayError> {
        match &backend.url {
            Some(url) => {
                info!(backend = name, url = %url, timeout_ms = backend.timeout.as_millis() as u64, "Using HTTP backend");
                HttpBackend::new(client.clone(), url, backend.timeout).map(Some)
            }
            None => {
                info!(backend = name, "No URL configured, using fixed local data");
                Ok(None)
            }
        }
    };

    let identity: Arc<dyn IdentityClient> =
        match resolve("identity", &config.identity)? {
            Some(http) => Arc::new(HttpIdentityClient::new(http)),
            None => Arc::new(FixedIdentityClient),
        };
    let access: Arc<dyn AccessClient> = match resolve("access", &config.access)? {
        Some(http) => Arc::new(HttpAccessClient::new(http)),
        None => Arc::new(FixedAccessClient),
    };
    let context: Arc<dyn ContextClient> =
        match resolve("context", &config.context)? {
            Some(http) => Arc::new(HttpContextClient::new(http, config.context_limit)),
            None => Arc::new(FixedContextClient),
        };

    Ok(DependencyClients {
        identity,
        access,
        context,
    })
}
