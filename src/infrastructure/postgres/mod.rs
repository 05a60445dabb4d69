//! PostgreSQL connection setup.
//!
//! Opens the primary and optional read-replica pools with bounded retry
//! before the server accepts traffic.

pub mod pool;
mod retry;

pub use pool::{DatabasePools, StartupError};
pub use retry::{retry, Backoff, RetryExhausted, RetryPolicy};
