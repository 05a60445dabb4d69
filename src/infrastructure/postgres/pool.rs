//! PostgreSQL connection pools with startup retry and read/write splitting.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Connection;
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::metrics::ConnectMetrics;

use super::retry::{retry, RetryPolicy};

/// Errors that prevent the service from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The store never answered; the process must not begin serving
    #[error("could not connect to {role} database at {url} after {attempts} attempts: {source}")]
    Unrecoverable {
        role: &'static str,
        url: String,
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to prepare database schema: {0}")]
    Schema(#[source] sqlx::Error),
}

/// Primary (write) pool plus the pool used for reads.
///
/// Without a distinct replica the read pool is a clone of the primary, so both
/// handles share the same underlying connections.
#[derive(Clone)]
pub struct DatabasePools {
    primary: PgPool,
    read: PgPool,
    has_read_replica: bool,
}

impl DatabasePools {
    /// Open and ping the primary, then the read replica if one is configured.
    ///
    /// Each endpoint gets `connect_attempts` sequential tries. The first delay
    /// is `connect_retry_delay_ms`, grown by `connect_backoff_multiplier`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StartupError> {
        let policy = RetryPolicy::from(config);

        let primary = connect_endpoint(config, &policy, "primary", &config.host, config.port).await?;

        let (read, has_read_replica) = match config.read_endpoint() {
            Some((host, port)) => {
                let read = connect_endpoint(config, &policy, "read", host, port).await?;
                (read, true)
            }
            None => {
                tracing::info!("No read replica configured, reads use the primary connection");
                (primary.clone(), false)
            }
        };

        Ok(Self {
            primary,
            read,
            has_read_replica,
        })
    }

    /// Wrap already-open pools, e.g. in tests
    pub fn from_pools(primary: PgPool, read: Option<PgPool>) -> Self {
        let has_read_replica = read.is_some();
        Self {
            read: read.unwrap_or_else(|| primary.clone()),
            primary,
            has_read_replica,
        }
    }

    /// Pool for writes and health checks.
    pub fn primary(&self) -> &PgPool {
        &self.primary
    }

    /// Pool for reads (the primary when no replica is configured).
    pub fn read(&self) -> &PgPool {
        &self.read
    }

    pub fn has_read_replica(&self) -> bool {
        self.has_read_replica
    }

    /// Ping the primary.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        ping(&self.primary).await
    }

    /// Close the pools gracefully.
    pub async fn close(&self) {
        if self.has_read_replica {
            self.read.close().await;
        }
        self.primary.close().await;
        tracing::info!("PostgreSQL connection pools closed");
    }
}

async fn connect_endpoint(
    config: &DatabaseConfig,
    policy: &RetryPolicy,
    role: &'static str,
    host: &str,
    port: u16,
) -> Result<PgPool, StartupError> {
    let url = config.display_url(host, port);
    tracing::info!(
        role = role,
        url = %url,
        attempts = policy.max_attempts,
        "Connecting to database"
    );

    let result = retry(policy, role, |attempt| {
        let options = connect_options(config, host, port);
        async move {
            tracing::info!(role = role, attempt = attempt, "Opening database connection");
            let outcome = open_and_ping(config, options).await;
            ConnectMetrics::record_attempt(role, outcome.is_ok());
            outcome
        }
    })
    .await;

    match result {
        Ok(pool) => {
            tracing::info!(
                role = role,
                url = %url,
                pool_size = config.pool_size,
                "Successfully connected to database"
            );
            Ok(pool)
        }
        Err(exhausted) => Err(StartupError::Unrecoverable {
            role,
            url,
            attempts: exhausted.attempts,
            source: exhausted.source,
        }),
    }
}

fn connect_options(config: &DatabaseConfig, host: &str, port: u16) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(host)
        .port(port)
        .username(&config.user)
        .database(&config.name);

    match &config.password {
        Some(password) => options.password(password),
        None => options,
    }
}

async fn open_and_ping(
    config: &DatabaseConfig,
    options: PgConnectOptions,
) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.pool_size)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .connect_with(options)
        .await?;

    if let Err(e) = ping(&pool).await {
        pool.close().await;
        return Err(e);
    }

    Ok(pool)
}

async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    conn.ping().await
}
