//! Process-wide initialization for the Warden binaries

use std::sync::Once;

static INIT: Once = Once::new();

/// Load `.env` (current directory or any parent) into the process environment
///
/// Must run before configuration is read so `WARDEN_*` overrides from the
/// file are visible. Safe to call multiple times - only the first call does work.
pub fn initialize_environment() {
    INIT.call_once(|| match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable environment file"),
    });
}
