//! Circuit breaker pattern implementation for store calls

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::metrics::BreakerMetrics;

use super::counts::{Counts, TripPolicy};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, requests flow through normally
    Closed,
    /// Circuit is open, requests are rejected
    Open,
    /// Circuit is half-open, allowing a limited number of trial requests
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }

    /// Numeric encoding used by the state gauge (0=closed, 1=open, 2=half-open)
    pub fn as_gauge(&self) -> i64 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

/// Reason the breaker refused to run an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BreakerRejection {
    #[error("circuit breaker is open")]
    Open,

    #[error("circuit breaker is half-open and its trial budget is exhausted")]
    TooManyRequests,
}

impl BreakerRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerRejection::Open => "open",
            BreakerRejection::TooManyRequests => "too_many_requests",
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Name used in logs and metric labels
    pub name: String,
    /// Trial calls admitted while half-open, and consecutive successes needed to close
    pub max_requests: u32,
    /// Period after which closed-state counts are cleared (zero disables)
    pub interval: Duration,
    /// Time spent open before admitting trial calls
    pub timeout: Duration,
    /// Closed -> Open rule
    pub trip: TripPolicy,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: "database".to_string(),
            max_requests: 1,
            interval: Duration::from_secs(60),
            timeout: Duration::from_secs(30),
            trip: TripPolicy::default(),
        }
    }
}

struct BreakerInner {
    state: CircuitState,
    generation: u64,
    counts: Counts,
    /// Closed: next window reset. Open: end of cooldown. Half-open: unused.
    expiry: Option<Instant>,
    changed_at: DateTime<Utc>,
}

/// Circuit breaker guarding calls to a failing-prone dependency.
///
/// All bookkeeping happens under one mutex, which is never held while the
/// guarded operation runs. Each admitted call remembers the generation it was
/// admitted in; outcomes arriving after the generation moved on (a state change
/// or a window reset) are dropped so they cannot pollute the new window.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with default configuration
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    /// Create a new circuit breaker with custom configuration
    pub fn with_config(mut config: CircuitBreakerConfig) -> Self {
        config.max_requests = config.max_requests.max(1);

        let now = Instant::now();
        let expiry = (!config.interval.is_zero()).then(|| now + config.interval);
        BreakerMetrics::set_state(&config.name, CircuitState::Closed);

        Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                generation: 0,
                counts: Counts::default(),
                expiry,
                changed_at: Utc::now(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get the current state, applying any time-based transition that is due
    pub fn state(&self) -> CircuitState {
        let mut inner = self.lock();
        self.refresh(&mut inner, Instant::now());
        inner.state
    }

    /// Run an async operation under the breaker.
    ///
    /// Rejections are converted into the caller's error type; the operation's
    /// own result is returned untouched. If the returned future is dropped
    /// before the operation finishes (client gone, timeout, panic), the call
    /// is recorded as a failure.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<BreakerRejection>,
    {
        let admission = Admission {
            breaker: self,
            generation: self.before_request()?,
            settled: false,
        };

        let result = operation().await;
        admission.settle(result.is_ok());
        result
    }

    fn before_request(&self) -> Result<u64, BreakerRejection> {
        let mut inner = self.lock();
        self.refresh(&mut inner, Instant::now());

        let rejection = match inner.state {
            CircuitState::Open => Some(BreakerRejection::Open),
            CircuitState::HalfOpen if inner.counts.requests >= self.config.max_requests => {
                Some(BreakerRejection::TooManyRequests)
            }
            _ => None,
        };

        if let Some(rejection) = rejection {
            BreakerMetrics::record_rejection(&self.config.name, rejection);
            tracing::debug!(
                breaker = %self.config.name,
                reason = rejection.as_str(),
                "Circuit breaker rejected request"
            );
            return Err(rejection);
        }

        inner.counts.on_request();
        Ok(inner.generation)
    }

    fn after_request(&self, generation: u64, success: bool) {
        let now = Instant::now();
        let mut inner = self.lock();
        self.refresh(&mut inner, now);

        if inner.generation != generation {
            return;
        }

        if success {
            self.on_success(&mut inner, now);
        } else {
            self.on_failure(&mut inner, now);
        }
    }

    fn on_success(&self, inner: &mut BreakerInner, now: Instant) {
        match inner.state {
            CircuitState::Closed => inner.counts.on_success(),
            CircuitState::HalfOpen => {
                inner.counts.on_success();
                if inner.counts.consecutive_successes >= self.config.max_requests {
                    self.set_state(inner, CircuitState::Closed, now);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, inner: &mut BreakerInner, now: Instant) {
        match inner.state {
            CircuitState::Closed => {
                inner.counts.on_failure();
                if self.config.trip.should_trip(&inner.counts) {
                    tracing::warn!(
                        breaker = %self.config.name,
                        requests = inner.counts.requests,
                        failures = inner.counts.total_failures,
                        "Circuit breaker trip condition met"
                    );
                    self.set_state(inner, CircuitState::Open, now);
                }
            }
            // Any failed trial reopens the circuit and restarts the cooldown
            CircuitState::HalfOpen => self.set_state(inner, CircuitState::Open, now),
            CircuitState::Open => {}
        }
    }

    /// Apply transitions driven purely by the clock
    fn refresh(&self, inner: &mut BreakerInner, now: Instant) {
        let expired = inner.expiry.is_some_and(|expiry| expiry <= now);
        match inner.state {
            CircuitState::Closed if expired => self.new_generation(inner, now),
            CircuitState::Open if expired => self.set_state(inner, CircuitState::HalfOpen, now),
            _ => {}
        }
    }

    fn set_state(&self, inner: &mut BreakerInner, to: CircuitState, now: Instant) {
        if inner.state == to {
            return;
        }

        let from = inner.state;
        inner.state = to;
        inner.changed_at = Utc::now();
        self.new_generation(inner, now);

        BreakerMetrics::record_transition(&self.config.name, to);
        match to {
            CircuitState::Open => tracing::warn!(
                breaker = %self.config.name,
                from = from.as_str(),
                to = to.as_str(),
                timeout_ms = self.config.timeout.as_millis() as u64,
                "Circuit breaker opened"
            ),
            _ => tracing::info!(
                breaker = %self.config.name,
                from = from.as_str(),
                to = to.as_str(),
                "Circuit breaker state changed"
            ),
        }
    }

    fn new_generation(&self, inner: &mut BreakerInner, now: Instant) {
        inner.generation += 1;
        inner.counts.clear();
        inner.expiry = match inner.state {
            CircuitState::Closed if self.config.interval.is_zero() => None,
            CircuitState::Closed => Some(now + self.config.interval),
            CircuitState::Open => Some(now + self.config.timeout),
            CircuitState::HalfOpen => None,
        };
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get statistics snapshot
    pub fn stats(&self) -> CircuitBreakerStats {
        let mut inner = self.lock();
        self.refresh(&mut inner, Instant::now());

        CircuitBreakerStats {
            name: self.config.name.clone(),
            state: inner.state,
            generation: inner.generation,
            counts: inner.counts,
            last_state_change: inner.changed_at,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

/// A call admitted by the breaker whose outcome is still pending.
///
/// Dropping it unsettled counts as a failure, so an abandoned half-open trial
/// frees its slot instead of holding it forever.
struct Admission<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl Admission<'_> {
    fn settle(mut self, success: bool) {
        self.settled = true;
        self.breaker.after_request(self.generation, success);
    }
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!(
                breaker = %self.breaker.config.name,
                "Guarded call dropped before completing, counting as failure"
            );
            self.breaker.after_request(self.generation, false);
        }
    }
}

/// Circuit breaker statistics
#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub name: String,
    pub state: CircuitState,
    pub generation: u64,
    pub counts: Counts,
    pub last_state_change: DateTime<Utc>,
}
