//! Gateway service: configuration, wiring and server lifecycle.

use crate::aggregator::{Aggregator, DependencyClients};
use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::middleware::GatewayMetrics;
use crate::ports::{Clock, SystemClock};
use crate::router::{build_router, AppState};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Chat-summary gateway service state
pub struct GatewayService {
    config: GatewayConfig,
    aggregator: Aggregator,
    clock: Arc<dyn Clock>,
    metrics: Arc<GatewayMetrics>,
}

impl GatewayService {
    /// Create a new gateway service over the given dependency clients
    pub fn new(config: GatewayConfig, clients: DependencyClients) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self {
            config,
            aggregator: Aggregator::new(clients),
            clock: Arc::new(SystemClock),
            metrics: Arc::new(GatewayMetrics::new()),
        })
    }

    /// Replace the clock used for response and health timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.aggregator = self.aggregator.with_clock(Arc::clone(&clock));
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get metrics
    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Build the HTTP router
    pub fn router(&self) -> Router {
        let state = AppState {
            aggregator: self.aggregator.clone(),
            sla: self.config.sla.max_response_time,
            metrics: Arc::clone(&self.metrics),
            clock: Arc::clone(&self.clock),
        };
        build_router(state, self.config.sla.request_timeout)
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight
    /// requests.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;
        info!(
            addr = %addr,
            sla_ms = self.config.sla.max_response_time.as_millis() as u64,
            "Chat summary gateway listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::Serve(e.to_string()))?;

        info!("Chat summary gateway stopped");
        Ok(())
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", addr, e)))?;
        self.serve(listener, shutdown).await
    }
}
