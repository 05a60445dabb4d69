//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::resilience::{BreakerRejection, CircuitState};

use super::{
    CIRCUIT_BREAKER_REJECTIONS_TOTAL, CIRCUIT_BREAKER_STATE, CIRCUIT_BREAKER_TRANSITIONS_TOTAL,
    DB_CONNECT_ATTEMPTS_TOTAL, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION, STORE_OPERATIONS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording HTTP metrics
pub struct HttpMetrics;

impl HttpMetrics {
    /// Record a completed request
    pub fn record_request(method: &str, path: &str, status: u16, latency_secs: f64) {
        let status = status.to_string();
        HTTP_REQUESTS_TOTAL
            .with_label_values(&[method, path, status.as_str()])
            .inc();
        HTTP_REQUEST_DURATION
            .with_label_values(&[method, path])
            .observe(latency_secs);
    }
}

/// Helper struct for recording circuit breaker metrics
pub struct BreakerMetrics;

impl BreakerMetrics {
    /// Publish the current state
    pub fn set_state(breaker: &str, state: CircuitState) {
        CIRCUIT_BREAKER_STATE
            .with_label_values(&[breaker])
            .set(state.as_gauge());
    }

    /// Record a transition and publish the new state
    pub fn record_transition(breaker: &str, to: CircuitState) {
        CIRCUIT_BREAKER_TRANSITIONS_TOTAL
            .with_label_values(&[breaker, to.as_str()])
            .inc();
        Self::set_state(breaker, to);
    }

    /// Record a call rejected without reaching the store
    pub fn record_rejection(breaker: &str, reason: BreakerRejection) {
        CIRCUIT_BREAKER_REJECTIONS_TOTAL
            .with_label_values(&[breaker, reason.as_str()])
            .inc();
    }
}

/// Helper struct for recording store operation metrics
pub struct StoreMetrics;

impl StoreMetrics {
    pub fn record_success(operation: &str) {
        STORE_OPERATIONS_TOTAL
            .with_label_values(&[operation, "success"])
            .inc();
    }

    pub fn record_error(operation: &str) {
        STORE_OPERATIONS_TOTAL
            .with_label_values(&[operation, "error"])
            .inc();
    }
}

/// Helper struct for recording startup connection attempts
pub struct ConnectMetrics;

impl ConnectMetrics {
    pub fn record_attempt(role: &str, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        DB_CONNECT_ATTEMPTS_TOTAL
            .with_label_values(&[role, outcome])
            .inc();
    }
}
