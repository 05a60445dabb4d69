//! Prometheus metrics for the todo service.
//!
//! - HTTP metrics (requests by route and status, latency)
//! - Circuit breaker metrics (state, transitions, rejections)
//! - Store metrics (operation outcomes, startup connection attempts)

mod helpers;

pub use helpers::{encode_metrics, BreakerMetrics, ConnectMetrics, HttpMetrics, StoreMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "todo";

lazy_static! {
    // ============================================================================
    // HTTP API Metrics
    // ============================================================================

    /// HTTP request counter by method, matched route and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_http_requests_total", METRIC_PREFIX),
        "Total HTTP requests",
        &["method", "path", "status"]
    ).unwrap();

    /// HTTP request latency
    pub static ref HTTP_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        format!("{}_http_request_duration_seconds", METRIC_PREFIX),
        "HTTP request latency in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    ).unwrap();

    // ============================================================================
    // Circuit Breaker Metrics
    // ============================================================================

    /// Circuit breaker state (0=closed, 1=open, 2=half-open)
    pub static ref CIRCUIT_BREAKER_STATE: IntGaugeVec = register_int_gauge_vec!(
        format!("{}_circuit_breaker_state", METRIC_PREFIX),
        "Circuit breaker state (0=closed, 1=open, 2=half-open)",
        &["breaker"]
    ).unwrap();

    /// Circuit breaker state transitions by target state
    pub static ref CIRCUIT_BREAKER_TRANSITIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_circuit_breaker_transitions_total", METRIC_PREFIX),
        "Total circuit breaker state transitions",
        &["breaker", "to"]
    ).unwrap();

    /// Calls rejected without reaching the store
    pub static ref CIRCUIT_BREAKER_REJECTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_circuit_breaker_rejections_total", METRIC_PREFIX),
        "Total calls rejected by the circuit breaker",
        &["breaker", "reason"]
    ).unwrap();

    // ============================================================================
    // Store Metrics
    // ============================================================================

    /// Store operations by outcome
    pub static ref STORE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_store_operations_total", METRIC_PREFIX),
        "Total todo store operations",
        &["operation", "outcome"]
    ).unwrap();

    /// Startup connection attempts by role (primary/read) and outcome
    pub static ref DB_CONNECT_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_db_connect_attempts_total", METRIC_PREFIX),
        "Total database connection attempts at startup",
        &["role", "outcome"]
    ).unwrap();
}
