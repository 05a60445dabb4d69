use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::resilience::{CircuitBreakerConfig, TripPolicy};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Connection settings for the primary store and its optional read replica.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Store backend: "postgres" or "memory"
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_name")]
    pub name: String,
    /// Read replica host; reads go to the primary when unset
    #[serde(default)]
    pub read_host: Option<String>,
    /// Read replica port; defaults to `port`
    #[serde(default)]
    pub read_port: Option<u16>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// Connection attempts per endpoint before startup is aborted
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    /// Delay before the second attempt
    #[serde(default = "default_connect_retry_delay")]
    pub connect_retry_delay_ms: u64,
    /// Upper bound for a single delay when backing off
    #[serde(default = "default_connect_retry_max_delay")]
    pub connect_retry_max_delay_ms: u64,
    /// Delay growth per failed attempt; 1.0 keeps it fixed
    #[serde(default = "default_connect_backoff_multiplier")]
    pub connect_backoff_multiplier: f64,
    /// Random spread applied to each delay (0.0 to 1.0)
    #[serde(default)]
    pub connect_retry_jitter: f64,
    /// Create the todos table on startup if missing
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerSettings {
    #[serde(default = "default_breaker_name")]
    pub name: String,
    /// Trial calls admitted while half-open
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Closed-state counting window in seconds (0 = never reset)
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Seconds spent open before admitting trial calls
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_min_requests")]
    pub min_requests: u32,
    #[serde(default = "default_failure_ratio")]
    pub failure_ratio: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_backend() -> String {
    "postgres".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "todos".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_idle_timeout() -> u64 {
    300 // 5 minutes
}

fn default_connect_attempts() -> u32 {
    5
}

fn default_connect_retry_delay() -> u64 {
    2_000 // 2 seconds
}

fn default_connect_retry_max_delay() -> u64 {
    30_000
}

fn default_connect_backoff_multiplier() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_breaker_name() -> String {
    "database".to_string()
}

fn default_max_requests() -> u32 {
    1
}

fn default_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    30
}

fn default_min_requests() -> u32 {
    3
}

fn default_failure_ratio() -> f64 {
    0.6
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.backend", "postgres")?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // APP_SERVER__PORT, APP_DATABASE__READ_HOST, APP_CIRCUIT_BREAKER__TIMEOUT_SECONDS, ...
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            )
            // Plain PORT as set by container platforms wins over everything else
            .set_override_option("server.port", env::var("PORT").ok())?;

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl DatabaseConfig {
    /// Read replica endpoint, if one distinct from the primary is configured
    pub fn read_endpoint(&self) -> Option<(&str, u16)> {
        let host = self.read_host.as_deref().filter(|h| !h.is_empty())?;
        let port = self.read_port.unwrap_or(self.port);

        if host == self.host && port == self.port {
            None
        } else {
            Some((host, port))
        }
    }

    /// Connection URL for logging, with the password masked
    pub fn display_url(&self, host: &str, port: u16) -> String {
        let credentials = match &self.password {
            Some(_) => format!("{}:***", self.user),
            None => self.user.clone(),
        };
        format!("postgres://{}@{}:{}/{}", credentials, host, port, self.name)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.connect_retry_delay_ms)
    }
}

impl From<&CircuitBreakerSettings> for CircuitBreakerConfig {
    fn from(settings: &CircuitBreakerSettings) -> Self {
        Self {
            name: settings.name.clone(),
            max_requests: settings.max_requests,
            interval: Duration::from_secs(settings.interval_seconds),
            timeout: Duration::from_secs(settings.timeout_seconds),
            trip: TripPolicy {
                min_requests: settings.min_requests,
                failure_ratio: settings.failure_ratio,
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            user: default_db_user(),
            password: None,
            host: default_db_host(),
            port: default_db_port(),
            name: default_db_name(),
            read_host: None,
            read_port: None,
            pool_size: default_pool_size(),
            acquire_timeout_seconds: default_acquire_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
            connect_attempts: default_connect_attempts(),
            connect_retry_delay_ms: default_connect_retry_delay(),
            connect_retry_max_delay_ms: default_connect_retry_max_delay(),
            connect_backoff_multiplier: default_connect_backoff_multiplier(),
            connect_retry_jitter: 0.0,
            run_migrations: default_true(),
        }
    }
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            name: default_breaker_name(),
            max_requests: default_max_requests(),
            interval_seconds: default_interval(),
            timeout_seconds: default_timeout(),
            min_requests: default_min_requests(),
            failure_ratio: default_failure_ratio(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
