//! Todo store factory

use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::postgres::{DatabasePools, StartupError};

use super::memory_store::MemoryTodoStore;
use super::postgres_store::PostgresTodoStore;
use super::store::TodoStore;

/// Create the todo store selected by configuration.
///
/// - `"memory"`: a `MemoryTodoStore`, no database involved
/// - `"postgres"` (default): connects the primary and read pools with retry,
///   then creates the table if `run_migrations` is set
///
/// Connection failures after the retry budget are returned as
/// [`StartupError::Unrecoverable`].
pub async fn create_todo_store(
    config: &DatabaseConfig,
) -> Result<Arc<dyn TodoStore>, StartupError> {
    match config.backend.as_str() {
        "memory" => {
            tracing::info!(backend = "memory", "Creating memory todo store");
            Ok(Arc::new(MemoryTodoStore::new()))
        }
        other => {
            if other != "postgres" {
                tracing::warn!(
                    backend = %other,
                    "Unknown store backend, using PostgreSQL"
                );
            }

            let pools = DatabasePools::connect(config).await?;
            tracing::info!(
                backend = "postgres",
                read_replica = pools.has_read_replica(),
                "Creating PostgreSQL todo store"
            );

            let store = PostgresTodoStore::new(pools);
            if config.run_migrations {
                if let Err(e) = store.ensure_schema().await {
                    store.pools().close().await;
                    return Err(StartupError::Schema(e));
                }
            }

            Ok(Arc::new(store))
        }
    }
}
