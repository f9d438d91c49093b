//! Airlock daemon: runs the supervisor of a waiting room.
//!
//! Main entry point that wires all crates together and ticks the
//! supervisor until shutdown.

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use airlock_core::config::AppConfig;
use airlock_core::error::AppError;
use airlock_server::AirlockApp;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Airlock daemon error");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("AIRLOCK_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Build the application and tick the supervisor until shutdown
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting airlockd");

    let app = AirlockApp::build(&config).await?;
    if !app.store.health_check().await? {
        return Err(AppError::store("Shared store did not answer the health check"));
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = app.runner(&config);
    let worker = tokio::spawn(async move { runner.run(shutdown_rx).await });

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping supervisor...");
    let _ = shutdown_tx.send(true);

    worker
        .await
        .map_err(|e| AppError::internal(format!("Supervisor task failed: {e}")))?;

    tracing::info!("airlockd stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
