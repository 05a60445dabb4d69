//! Infrastructure layer modules
//!
//! This module contains shared infrastructure components:
//! - `config`: Application configuration and settings
//! - `error`: Unified error types
//! - `metrics`: Prometheus metrics helpers
//! - `postgres`: PostgreSQL pools with startup retry
//! - `resilience`: Circuit breaker guarding store calls

pub mod config;
pub mod error;
pub mod metrics;
pub mod postgres;
pub mod resilience;
