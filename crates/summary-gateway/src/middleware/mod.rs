//! Middleware stack for the gateway.
//!
//! Layer order: Request → Tracing → Timeout → Handler
//!
//! Tracing sits outermost so the span and the echoed request id also cover
//! requests the timeout layer cuts short.

pub mod metrics;
pub mod timeout;
pub mod tracing;

pub use metrics::{AggregationTimer, GatewayMetrics};
pub use timeout::TimeoutLayer;
pub use self::tracing::TracingLayer;
