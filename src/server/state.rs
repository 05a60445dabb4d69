use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};
use crate::todo::TodoStore;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn TodoStore>,
    pub breaker: Arc<CircuitBreaker>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<dyn TodoStore>) -> Self {
        let breaker = CircuitBreaker::with_config(CircuitBreakerConfig::from(
            &settings.circuit_breaker,
        ));
        Self::with_breaker(settings, store, Arc::new(breaker))
    }

    /// Build state around an existing breaker, e.g. one shared across routers
    pub fn with_breaker(
        settings: Settings,
        store: Arc<dyn TodoStore>,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            store,
            breaker,
            start_time: Instant::now(),
        }
    }
}
