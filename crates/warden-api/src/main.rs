//! Warden API Server
//!
//! Serves quarantine files and validated redirects.
//!
//! Configuration comes from the environment, optionally layered over the TOML
//! file named by `WARDEN_CONFIG_FILE`. On unix, `SIGHUP` reloads the redirect
//! allowlist.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use warden_api::{AppState, bootstrap, routes};
use warden_config::ConfigurationLoader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize environment (load .env, etc.)
    warden_common::initialize_environment();

    let config_file = std::env::var_os("WARDEN_CONFIG_FILE").map(PathBuf::from);
    let loader = ConfigurationLoader::standard(config_file.as_deref());
    let config = loader.load().context("Invalid configuration")?;

    bootstrap::init_tracing(&config.telemetry);
    info!(service = %config.telemetry.service_name, "Starting Warden API server...");

    let state = bootstrap::initialize_app_state(&config);
    spawn_allowlist_reloader(state.clone(), loader);

    let app = routes::create_router_with_timeout(
        state,
        Duration::from_secs(config.api.timeout_seconds),
    );

    let addr = config.api.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(unix)]
fn spawn_allowlist_reloader(state: AppState, loader: ConfigurationLoader) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "SIGHUP handler unavailable; allowlist reload disabled");
                return;
            }
        };

        while hangups.recv().await.is_some() {
            match bootstrap::reload_allowlist(&state, &loader) {
                Ok(entries) => info!(entries, "Redirect allowlist reloaded"),
                Err(e) => tracing::warn!(error = %e, "Allowlist reload failed; keeping previous list"),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_allowlist_reloader(_state: AppState, _loader: ConfigurationLoader) {}
