//! Todo CRUD endpoints.
//!
//! Every store call goes through the circuit breaker. Input is validated
//! before that, so malformed requests never count against the store.

use std::future::Future;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::error::Result;
use crate::metrics::StoreMetrics;
use crate::server::AppState;
use crate::todo::{
    parse_todo_id, CreateTodoRequest, StoreError, Todo, UpdateTodoRequest, ValidationError,
};

/// Run a store call under the breaker and record its outcome.
async fn guarded<T, F, Fut>(
    state: &AppState,
    operation: &'static str,
    call: F,
) -> std::result::Result<T, StoreError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<T, StoreError>>,
{
    let result = state.breaker.execute(call).await;
    match &result {
        Ok(_) => StoreMetrics::record_success(operation),
        // Rejections are counted by the breaker itself
        Err(StoreError::Rejected(_)) => {}
        Err(_) => StoreMetrics::record_error(operation),
    }
    result
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ValidationError::InvalidBody(rejection.body_text()).into())
}

/// GET /todos - List all todos ordered by id
#[tracing::instrument(name = "http.list_todos", skip(state))]
pub async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>> {
    let todos = guarded(&state, "list", || state.store.list()).await?;
    Ok(Json(todos))
}

/// POST /todos - Create a todo
#[tracing::instrument(name = "http.create_todo", skip(state, payload))]
pub async fn create_todo(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>)> {
    let request = json_body(payload)?;
    let task = request.task()?;

    let todo = guarded(&state, "create", || state.store.create(task)).await?;
    tracing::info!(todo_id = todo.id, "Todo created");

    Ok((StatusCode::CREATED, Json(todo)))
}

/// PUT /todos/{id} - Set the completed flag
#[tracing::instrument(name = "http.update_todo", skip(state, payload))]
pub async fn update_todo(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: std::result::Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let id = parse_todo_id(&raw_id)?;
    let request = json_body(payload)?;

    let found = guarded(&state, "update", || {
        state.store.set_completed(id, request.completed)
    })
    .await?;
    if !found {
        tracing::debug!(todo_id = id, "Update matched no todo");
    }

    Ok(StatusCode::OK)
}

/// DELETE /todos/{id} - Delete a todo
#[tracing::instrument(name = "http.delete_todo", skip(state))]
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_todo_id(&raw_id)?;

    let found = guarded(&state, "delete", || state.store.delete(id)).await?;
    if !found {
        tracing::debug!(todo_id = id, "Delete matched no todo");
    }

    Ok(StatusCode::NO_CONTENT)
}
