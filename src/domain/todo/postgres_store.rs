//! PostgreSQL-backed todo store.
//!
//! Writes go to the primary pool, reads to the read pool (the primary itself
//! when no replica is configured).
//!
//! Table structure:
//! - `todos (id SERIAL PRIMARY KEY, task TEXT NOT NULL, completed BOOLEAN NOT NULL DEFAULT FALSE)`

use async_trait::async_trait;

use crate::postgres::DatabasePools;

use super::models::Todo;
use super::store::{StoreError, TodoStore};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS todos (
        id SERIAL PRIMARY KEY,
        task TEXT NOT NULL,
        completed BOOLEAN NOT NULL DEFAULT FALSE
    )
"#;

pub struct PostgresTodoStore {
    pools: DatabasePools,
}

impl PostgresTodoStore {
    pub fn new(pools: DatabasePools) -> Self {
        Self { pools }
    }

    pub fn pools(&self) -> &DatabasePools {
        &self.pools
    }

    /// Create the todos table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(CREATE_TABLE)
            .execute(self.pools.primary())
            .await?;
        tracing::info!("Todos table ready");
        Ok(())
    }
}

#[async_trait]
impl TodoStore for PostgresTodoStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        let rows: Vec<(i32, String, bool)> =
            sqlx::query_as("SELECT id, task, completed FROM todos ORDER BY id")
                .fetch_all(self.pools.read())
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, task, completed)| Todo {
                id,
                task,
                completed,
            })
            .collect())
    }

    async fn create(&self, task: &str) -> Result<Todo, StoreError> {
        let (id, task, completed): (i32, String, bool) = sqlx::query_as(
            "INSERT INTO todos (task) VALUES ($1) RETURNING id, task, completed",
        )
        .bind(task)
        .fetch_one(self.pools.primary())
        .await?;

        tracing::debug!(todo_id = id, "Todo inserted");

        Ok(Todo {
            id,
            task,
            completed,
        })
    }

    async fn set_completed(&self, id: i32, completed: bool) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE todos SET completed = $1 WHERE id = $2")
            .bind(completed)
            .bind(id)
            .execute(self.pools.primary())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(self.pools.primary())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.pools.ping().await?;
        Ok(())
    }

    async fn close(&self) {
        self.pools.close().await;
    }
}
