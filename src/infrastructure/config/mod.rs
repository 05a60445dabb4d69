mod settings;

pub use settings::{
    CircuitBreakerSettings, DatabaseConfig, LogConfig, ServerConfig, Settings,
};
