// Infrastructure layer (shared components)
pub mod infrastructure;

// Re-export infrastructure modules for shorter paths
pub use infrastructure::config;
pub use infrastructure::error;
pub use infrastructure::metrics;
pub use infrastructure::postgres;
pub use infrastructure::resilience;

// Domain layer (business logic)
pub mod domain;
pub use domain::todo;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod telemetry;
