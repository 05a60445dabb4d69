mod app;
mod middleware;
mod state;

pub use app::create_app;
pub use middleware::{security_headers, track_metrics};
pub use state::AppState;
