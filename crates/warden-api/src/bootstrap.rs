//! Application bootstrap and service initialization
//!
//! Turns a loaded [`ApplicationConfig`] into the shared [`AppState`] and
//! installs the tracing subscriber. Kept apart from `main` so tests can build
//! the same state the server runs with.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use warden_config::{
    ApplicationConfig, ConfigResult, ConfigurationLoader, RedirectConfig, TelemetryConfig,
};
use warden_guard::{Allowlist, ChallengeTracker, PathGuard, RedirectGuard, RedirectObserver};

use crate::AppState;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(telemetry: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&telemetry.tracing_level));

    let result = if telemetry.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if let Err(e) = result {
        eprintln!("Tracing subscriber already installed: {e}");
    }
}

/// Build the redirect allowlist from configuration
pub fn allowlist_from(config: &RedirectConfig) -> Allowlist {
    Allowlist::new(config.allowlist.iter())
}

/// Build both guards and the challenge tracker
pub fn initialize_app_state(config: &ApplicationConfig) -> AppState {
    info!(
        base_dir = %config.quarantine.base_dir.display(),
        "Initializing quarantine guard..."
    );
    let path_guard = Arc::new(PathGuard::new(config.quarantine.base_dir.clone()));

    let allowlist = allowlist_from(&config.redirect);
    info!(
        entries = allowlist.entries().len(),
        origins = allowlist.origin_count(),
        "Initializing redirect guard..."
    );

    let challenges = Arc::new(ChallengeTracker::new());
    let observer: Arc<dyn RedirectObserver> = Arc::<ChallengeTracker>::clone(&challenges);
    let redirect_guard = Arc::new(RedirectGuard::with_observer(allowlist, observer));

    AppState::new(path_guard, redirect_guard, challenges)
}

/// Re-run the loader and swap the redirect allowlist
///
/// The quarantine directory is not reloaded. On error the current allowlist
/// stays in place.
///
/// # Errors
///
/// Returns the loader's source or validation error
pub fn reload_allowlist(state: &AppState, loader: &ConfigurationLoader) -> ConfigResult<usize> {
    let config = loader.load()?;
    let allowlist = allowlist_from(&config.redirect);
    let entries = allowlist.entries().len();
    state.redirect_guard.reload(allowlist);
    Ok(entries)
}
