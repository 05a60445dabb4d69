use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;

use todo_service::config::Settings;
use todo_service::server::{create_app, AppState};
use todo_service::telemetry::init_telemetry;
use todo_service::todo::create_todo_store;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new().context("Failed to load configuration")?;

    // Initialize logging
    init_telemetry(&settings.log)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = %settings.database.backend,
        "Configuration loaded"
    );

    // Connect the store; retries are exhausted inside, so failure here is fatal
    let store = match create_todo_store(&settings.database).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Unable to initialise the todo store");
            return Err(e.into());
        }
    };

    // Create application state
    let state = AppState::new(settings.clone(), store.clone());
    tracing::info!(
        breaker = %state.breaker.name(),
        "Application state initialized"
    );

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler())
        .await?;

    store.close().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
