//! Todo item and request payloads.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Store-assigned identifier
    pub id: i32,
    pub task: String,
    #[serde(default)]
    pub completed: bool,
}

/// Body of `POST /todos`. Any other fields (id, completed) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTodoRequest {
    pub task: String,
}

/// Body of `PUT /todos/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTodoRequest {
    pub completed: bool,
}

/// Client input rejected before any store call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Task must not be empty")]
    EmptyTask,

    #[error("Invalid todo ID: {0}")]
    InvalidId(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl CreateTodoRequest {
    /// The task text, provided it is not blank
    pub fn task(&self) -> Result<&str, ValidationError> {
        if self.task.trim().is_empty() {
            return Err(ValidationError::EmptyTask);
        }
        Ok(&self.task)
    }
}

/// Parse a path segment into a todo id.
///
/// Only positive 32-bit integers are accepted.
pub fn parse_todo_id(raw: &str) -> Result<i32, ValidationError> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidId(raw.to_string())),
    }
}
