//! Storage abstraction for todo items.
//!
//! Handlers only see `TodoStore`; whether items live in PostgreSQL or in
//! process memory is decided once at startup.

use async_trait::async_trait;
use thiserror::Error;

use crate::resilience::BreakerRejection;

use super::models::Todo;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// PostgreSQL operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Backend cannot serve requests right now
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The circuit breaker refused the call before it reached the store
    #[error(transparent)]
    Rejected(#[from] BreakerRejection),
}

/// Persistence for todo items.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Short backend name for logs and stats
    fn backend_name(&self) -> &'static str;

    /// All items ordered by id ascending
    async fn list(&self) -> Result<Vec<Todo>, StoreError>;

    /// Insert a new, not yet completed item and return it with its id
    async fn create(&self, task: &str) -> Result<Todo, StoreError>;

    /// Set the completed flag. Returns whether the item existed.
    async fn set_completed(&self, id: i32, completed: bool) -> Result<bool, StoreError>;

    /// Remove an item. Returns whether the item existed.
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;

    /// Check the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release connections on shutdown
    async fn close(&self) {}
}
