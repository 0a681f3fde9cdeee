pub mod health;
pub mod quarantine;
pub mod redirect;

use std::time::Duration;

use axum::{Router, http::StatusCode, middleware};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::AppState;

/// Router with every route, correlation IDs and request tracing
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(quarantine::routes())
        .merge(redirect::routes())
        .with_state(state)
        // Add correlation ID middleware to all routes
        .layer(middleware::from_fn(
            crate::middleware::correlation_id_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

/// [`create_router`] with a per-request timeout answered by `408 Request Timeout`
pub fn create_router_with_timeout(state: AppState, timeout: Duration) -> Router {
    create_router(state).layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        timeout,
    ))
}
