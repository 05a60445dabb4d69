//! Request outcome counters and the trip condition evaluated over them.

use serde::Serialize;

/// Outcome counters for the current breaker window.
///
/// `requests` counts admitted calls, including ones still in flight, so the
/// failure ratio is always computed against everything the breaker let through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub requests: u32,
    pub total_successes: u32,
    pub total_failures: u32,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
}

impl Counts {
    pub(crate) fn on_request(&mut self) {
        self.requests = self.requests.saturating_add(1);
    }

    pub(crate) fn on_success(&mut self) {
        self.total_successes = self.total_successes.saturating_add(1);
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
        self.consecutive_failures = 0;
    }

    pub(crate) fn on_failure(&mut self) {
        self.total_failures = self.total_failures.saturating_add(1);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_successes = 0;
    }

    pub(crate) fn clear(&mut self) {
        *self = Counts::default();
    }

    /// Failures over admitted requests, or `None` for an empty window.
    pub fn failure_ratio(&self) -> Option<f64> {
        if self.requests == 0 {
            return None;
        }
        Some(f64::from(self.total_failures) / f64::from(self.requests))
    }
}

/// Closed -> Open rule: enough traffic and a high enough failure ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripPolicy {
    /// Minimum admitted requests in the window before tripping is considered
    pub min_requests: u32,
    /// Failure ratio (0.0 to 1.0) at or above which the circuit opens
    pub failure_ratio: f64,
}

impl Default for TripPolicy {
    fn default() -> Self {
        Self {
            min_requests: 3,
            failure_ratio: 0.6,
        }
    }
}

impl TripPolicy {
    pub fn should_trip(&self, counts: &Counts) -> bool {
        match counts.failure_ratio() {
            Some(ratio) => counts.requests >= self.min_requests && ratio >= self.failure_ratio,
            None => false,
        }
    }
}
