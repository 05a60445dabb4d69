//! Resilience primitives for calls to the backing store.
//!
//! - `CircuitBreaker`: admits or rejects store calls based on recent outcomes
//! - `Counts` / `TripPolicy`: the counting window and the rule that opens the circuit

mod circuit_breaker;
mod counts;

pub use circuit_breaker::{
    BreakerRejection, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState,
};
pub use counts::{Counts, TripPolicy};
