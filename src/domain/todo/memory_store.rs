//! In-memory todo store.
//!
//! Used when `database.backend = "memory"` and by tests. Contents are lost on
//! restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::models::Todo;
use super::store::{StoreError, TodoStore};

struct MemoryInner {
    next_id: i32,
    items: BTreeMap<i32, Todo>,
}

pub struct MemoryTodoStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryInner {
                next_id: 1,
                items: BTreeMap::new(),
            }),
        }
    }
}

impl Default for MemoryTodoStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        let inner = self.inner.read().await;
        // BTreeMap iterates in key order
        Ok(inner.items.values().cloned().collect())
    }

    async fn create(&self, task: &str) -> Result<Todo, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id = id
            .checked_add(1)
            .ok_or_else(|| StoreError::Unavailable("todo id space exhausted".to_string()))?;

        let todo = Todo {
            id,
            task: task.to_string(),
            completed: false,
        };
        inner.items.insert(id, todo.clone());
        Ok(todo)
    }

    async fn set_completed(&self, id: i32, completed: bool) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.items.get_mut(&id) {
            Some(todo) => {
                todo.completed = completed;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.items.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
