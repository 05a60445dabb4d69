//! Health check and statistics endpoints.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::resilience::Counts;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub version: String,
    pub uptime_seconds: u64,
    pub store: StoreStats,
    pub circuit_breaker: CircuitBreakerStatsResponse,
}

#[derive(Debug, Serialize)]
pub struct StoreStats {
    pub backend: String,
}

#[derive(Debug, Serialize)]
pub struct CircuitBreakerStatsResponse {
    pub name: String,
    pub state: String,
    pub generation: u64,
    pub counts: Counts,
    pub last_state_change: DateTime<Utc>,
}

/// GET /healthz - Ping the primary store
///
/// Deliberately bypasses the circuit breaker so probes always see the real
/// store status.
pub async fn healthz(State(state): State<AppState>) -> (StatusCode, String) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "OK".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database connection failed: {}", e),
            )
        }
    }
}

/// GET /stats - Circuit breaker and store statistics
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let breaker = state.breaker.stats();

    Json(StatsResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        store: StoreStats {
            backend: state.store.backend_name().to_string(),
        },
        circuit_breaker: CircuitBreakerStatsResponse {
            name: breaker.name,
            state: breaker.state.as_str().to_string(),
            generation: breaker.generation,
            counts: breaker.counts,
            last_state_change: breaker.last_state_change,
        },
    })
}
