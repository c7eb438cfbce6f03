//! Gateway counters, exposed as JSON on `/metrics`.

use crate::domain::error::FailureCause;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Gateway metrics
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    // Summary request counters
    pub requests_total: AtomicU64,
    pub requests_rejected: AtomicU64,
    pub method_rejected: AtomicU64,
    /// Runs dropped before an outcome was recorded (outer timeout)
    pub requests_abandoned: AtomicU64,

    // Aggregation outcomes
    pub aggregations_complete: AtomicU64,
    pub aggregations_degraded: AtomicU64,
    pub identity_failures: AtomicU64,
    pub access_failures: AtomicU64,
    pub critical_timeouts: AtomicU64,

    // Runs currently waiting on dependencies
    pub in_flight: AtomicU64,

    // Latency tracking (sum and count; no histogram)
    pub total_latency_ms: AtomicU64,
    pub request_count_for_latency: AtomicU64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a summary request rejected before aggregation
    pub fn record_rejected(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request using a method other than GET
    pub fn record_method_rejected(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.method_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a run whose request was cut off before it finished
    pub fn record_abandoned(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.requests_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful aggregation
    pub fn record_success(&self, degraded: bool, latency_ms: u64) {
        if degraded {
            self.aggregations_degraded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.aggregations_complete.fetch_add(1, Ordering::Relaxed);
        }
        self.record_latency(latency_ms);
    }

    /// Record a failed aggregation
    pub fn record_failure(&self, cause: FailureCause, latency_ms: u64) {
        let counter = match cause {
            FailureCause::IdentityFailed => &self.identity_failures,
            FailureCause::AccessFailed => &self.access_failures,
            FailureCause::CriticalTimeout => &self.critical_timeouts,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency_ms);
    }

    fn record_latency(&self, latency_ms: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.request_count_for_latency.fetch_add(1, Ordering::Relaxed);
    }

    /// Get average latency in ms
    pub fn average_latency_ms(&self) -> f64 {
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        let count = self.request_count_for_latency.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "requests": {
                "total": self.requests_total.load(Ordering::Relaxed),
                "rejected": self.requests_rejected.load(Ordering::Relaxed),
                "method_not_allowed": self.method_rejected.load(Ordering::Relaxed),
                "abandoned": self.requests_abandoned.load(Ordering::Relaxed),
                "in_flight": self.in_flight.load(Ordering::Relaxed),
            },
            "aggregations": {
                "complete": self.aggregations_complete.load(Ordering::Relaxed),
                "degraded": self.aggregations_degraded.load(Ordering::Relaxed),
            },
            "failures": {
                "identity_failed": self.identity_failures.load(Ordering::Relaxed),
                "access_failed": self.access_failures.load(Ordering::Relaxed),
                "critical_timeout": self.critical_timeouts.load(Ordering::Relaxed),
            },
            "latency": {
                "average_ms": self.average_latency_ms(),
            }
        })
    }
}

/// Times one aggregation run and keeps the in-flight gauge accurate.
///
/// Dropping the timer without finishing it (the request future was
/// cancelled) counts the run as abandoned.
pub struct AggregationTimer {
    start: Instant,
    metrics: Arc<GatewayMetrics>,
    finished: bool,
}

impl AggregationTimer {
    pub fn start(metrics: Arc<GatewayMetrics>) -> Self {
        metrics.in_flight.fetch_add(1, Ordering::Relaxed);
        Self {
            start: Instant::now(),
            metrics,
            finished: false,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn succeeded(mut self, degraded: bool) {
        self.finished = true;
        self.metrics.record_success(degraded, self.elapsed_ms());
    }

    pub fn failed(mut self, cause: FailureCause) {
        self.finished = true;
        self.metrics.record_failure(cause, self.elapsed_ms());
    }
}

impl Drop for AggregationTimer {
    fn drop(&mut self) {
        self.metrics.in_flight.fetch_sub(1, Ordering::Relaxed);
        if !self.finished {
            self.metrics.record_abandoned();
        }
    }
}
