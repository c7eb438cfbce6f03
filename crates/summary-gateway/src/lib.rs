#![allow(missing_docs)]

//! Chat-summary gateway - one composite query answered from three backends
//! under a hard latency budget.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        CHAT SUMMARY GATEWAY                          │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │   GET /api/v1/chat/summary      GET /health      GET /metrics        │
//! │              │                                                       │
//! │  ┌───────────┴────────────────────────────┐                          │
//! │  │   Middleware: Tracing → Timeout        │                          │
//! │  └───────────┬────────────────────────────┘                          │
//! │              │  validate ids, arm shared deadline                    │
//! │  ┌───────────┴────────────────────────────┐                          │
//! │  │        Scatter-Gather Aggregator       │                          │
//! │  │  critical: identity, access            │                          │
//! │  │  optional: context                     │                          │
//! │  └───────────┬────────────────────────────┘                          │
//! │              │  result | failure                                     │
//! │  ┌───────────┴────────────────────────────┐                          │
//! │  │          Response Assembler            │                          │
//! │  └────────────────────────────────────────┘                          │
//! └──────────────────────────────────────────────────────────────────────┘
//!         │                    │                     │
//!         ▼                    ▼                     ▼
//!   identity backend     access backend       context backend
//! ```
//!
//! # Outcomes
//!
//! - **200, `degraded: false`**: all three dependencies answered in time.
//! - **200, `degraded: true`**: both critical dependencies answered, the
//!   context did not (error, own timeout, or still pending at the deadline).
//! - **500**: a critical dependency failed, or the deadline fired before
//!   both critical dependencies answered.
//! - **400**: `user_id` or `chat_id` missing or empty.
//!
//! # Usage
//!
//! ```ignore
//! use summary_gateway::{adapters, GatewayConfig, GatewayService};
//!
//! let config = GatewayConfig::default();
//! let http = adapters::http_client(config.http.keep_alive)?;
//! let clients = adapters::build_clients(&config.backends, &http)?;
//! let service = GatewayService::new(config, clients)?;
//! service.start(shutdown_signal()).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod aggregator;
pub mod assembler;
pub mod domain;
pub mod middleware;
pub mod ports;
pub mod router;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports for public API
pub use aggregator::{Aggregator, DependencyClients};
pub use assembler::ChatSummaryResponse;
pub use domain::config::GatewayConfig;
pub use domain::error::{AggregationFailure, ApiError, DependencyError, GatewayError};
pub use domain::types::*;
pub use middleware::GatewayMetrics;
pub use router::SUMMARY_PATH;
pub use service::GatewayService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
