use axum::{
    routing::{get, put},
    Router,
};

use crate::server::AppState;

use super::health::{healthz, stats};
use super::metrics::prometheus_metrics;
use super::todos::{create_todo, delete_todo, list_todos, update_todo};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health, stats & metrics
        .route("/healthz", get(healthz))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Todo CRUD
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}", put(update_todo).delete(delete_todo))
}
