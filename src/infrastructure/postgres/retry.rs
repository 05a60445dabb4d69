//! Bounded retry with backoff for startup connection attempts

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use crate::config::DatabaseConfig;

/// Retry policy configuration.
///
/// With the default `multiplier` of 1.0 and no jitter every attempt is
/// separated by the same fixed delay.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt
    pub multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(5, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    /// Constant delay between attempts
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }
}

impl From<&DatabaseConfig> for RetryPolicy {
    fn from(config: &DatabaseConfig) -> Self {
        let initial_delay = config.retry_delay();
        Self {
            max_attempts: config.connect_attempts,
            initial_delay,
            max_delay: Duration::from_millis(config.connect_retry_max_delay_ms).max(initial_delay),
            multiplier: config.connect_backoff_multiplier.max(1.0),
            jitter_factor: config.connect_retry_jitter.clamp(0.0, 1.0),
        }
    }
}

/// Delay calculator for a [`RetryPolicy`]
pub struct Backoff {
    policy: RetryPolicy,
    current_delay_ms: f64,
    attempt: u32,
}

impl Backoff {
    pub fn new(policy: RetryPolicy) -> Self {
        let initial = policy.initial_delay.as_millis() as f64;
        Self {
            policy,
            current_delay_ms: initial,
            attempt: 0,
        }
    }

    /// Get the next delay duration
    pub fn next_delay(&mut self) -> Duration {
        self.attempt += 1;

        let max_delay_ms = self.policy.max_delay.as_millis() as f64;
        let base_delay = self.current_delay_ms.min(max_delay_ms);

        // Apply jitter only if there is a range to draw from
        let jitter_range = base_delay * self.policy.jitter_factor;
        let final_delay = if jitter_range > 0.0 {
            let jitter = rand::rng().random_range(-jitter_range..jitter_range);
            (base_delay + jitter).max(0.0)
        } else {
            base_delay
        };

        self.current_delay_ms = (base_delay * self.policy.multiplier).min(max_delay_ms);

        Duration::from_millis(final_delay as u64)
    }

    /// Get the number of delays handed out so far
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// Every attempt failed; carries the last error seen
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempts: {source}")]
pub struct RetryExhausted<E>
where
    E: std::error::Error + 'static,
{
    pub attempts: u32,
    #[source]
    pub source: E,
}

/// Run `attempt` until it succeeds or the policy's budget is spent.
///
/// Attempts are strictly sequential. Each failure is logged; only the
/// final one is returned.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut attempt: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Display + 'static,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = Backoff::new(policy.clone());
    let mut current = 1;

    loop {
        match attempt(current).await {
            Ok(value) => return Ok(value),
            Err(e) if current >= max_attempts => {
                tracing::error!(
                    target_name = %what,
                    attempts = current,
                    error = %e,
                    "Retry budget exhausted"
                );
                return Err(RetryExhausted {
                    attempts: current,
                    source: e,
                });
            }
            Err(e) => {
                let delay = backoff.next_delay();
                tracing::warn!(
                    target_name = %what,
                    attempt = current,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                current += 1;
            }
        }
    }
}
