use clap::Parser;
use std::sync::Arc;
use tracing::info;

use calldash::config::{CliArgs, DashboardConfig};
use calldash::state::DashboardState;
use calldash::{controller, refresh, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calldash=info,tower_http=info".into()),
        )
        .init();

    let args = CliArgs::parse();
    let config = DashboardConfig::from_args(args);
    let port = config.port;
    let auto_refresh = config.auto_refresh;

    info!("Starting calldash v{}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", config.backend_url);
    info!("Auto-refresh: {}", auto_refresh);

    let state = Arc::new(DashboardState::new(config));

    // Initial load so the first render has data; individual failures are
    // surfaced as notices and leave that resource empty until the loop
    // catches up.
    let failed = controller::load_all(&state).await;
    if failed.is_empty() {
        state.sync.write().await.backend_reachable = true;
        info!("Initial data load complete");
    } else {
        info!(
            "Initial load finished with {} failed resource(s)",
            failed.len()
        );
    }

    // Spawn the background refresh loop
    let refresh_handle = if auto_refresh {
        Some(refresh::spawn_refresh_loop(state.clone()))
    } else {
        None
    };

    // Build and start HTTP server
    let router = server::build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Dashboard listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Dashboard shutting down");

    // Cancel the refresh loop and any in-flight call pollers
    state.shutdown().await;
    if let Some(handle) = refresh_handle {
        let _ = handle.await;
    }

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal");
}
