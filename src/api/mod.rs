//! API layer - HTTP endpoint handlers.

mod health;
mod metrics;
mod routes;
mod todos;

pub use health::{healthz, stats, StatsResponse};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
pub use todos::{create_todo, delete_todo, list_todos, update_todo};
