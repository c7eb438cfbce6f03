//! Domain types for the chat-summary gateway.
//!
//! Request/result model, error taxonomy, configuration and the shared
//! deadline. Nothing in here performs I/O except configuration loading.

pub mod config;
pub mod correlation;
pub mod deadline;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::{ConfigError, GatewayConfig, LogFormat};
pub use correlation::RequestId;
pub use deadline::{Deadline, DeadlineGuard, Fired};
pub use error::{
    AggregationFailure, ApiError, DependencyError, ErrorResponse, FailureCause, GatewayError,
    ValidationError,
};
pub use types::*;
