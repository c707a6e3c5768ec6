use anyhow::Context;
use tracing::info;

use crate::app::app;
use crate::cli::OutputFormat;
use crate::config;
use crate::database::DatabaseManager;
use crate::state::AppState;

pub async fn handle(_output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config().clone();
    info!("Starting Geofence API in {:?} mode", config.environment);

    let store = DatabaseManager::build_store(&config)
        .await
        .context("failed to initialize storage")?;

    let bind_addr = config.bind_addr();
    let router = app(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Geofence API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
