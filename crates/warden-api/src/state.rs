//! Application state for Axum handlers
//!
//! Both guards are built once at startup and shared by every handler.

use std::sync::Arc;

use warden_guard::{ChallengeTracker, PathGuard, RedirectGuard};

/// Application state containing the request guards
#[derive(Clone)]
pub struct AppState {
    /// Resolves quarantine file names
    pub path_guard: Arc<PathGuard>,
    /// Validates redirect targets; its allowlist can be swapped at runtime
    pub redirect_guard: Arc<RedirectGuard>,
    /// Observer registered on `redirect_guard`
    pub challenges: Arc<ChallengeTracker>,
}

impl AppState {
    #[must_use]
    pub const fn new(
        path_guard: Arc<PathGuard>,
        redirect_guard: Arc<RedirectGuard>,
        challenges: Arc<ChallengeTracker>,
    ) -> Self {
        Self {
            path_guard,
            redirect_guard,
            challenges,
        }
    }
}
