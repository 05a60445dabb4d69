//! Todo items: model, storage trait and its backends.

mod factory;
mod memory_store;
mod models;
mod postgres_store;
mod store;

pub use factory::create_todo_store;
pub use memory_store::MemoryTodoStore;
pub use models::{parse_todo_id, CreateTodoRequest, Todo, UpdateTodoRequest, ValidationError};
pub use postgres_store::PostgresTodoStore;
pub use store::{StoreError, TodoStore};
