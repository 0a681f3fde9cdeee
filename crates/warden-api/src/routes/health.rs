use crate::{AppState, middleware::RequestContext};
use axum::{Extension, Json, Router, extract::State, routing::get};
use serde_json::json;
use tracing::{info, instrument};

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Liveness plus a view of the loaded allowlist
#[instrument(skip_all, fields(correlation_id))]
async fn health_check(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
) -> Json<serde_json::Value> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    tracing::Span::current().record("correlation_id", correlation_id.to_string());

    info!(correlation_id = %correlation_id, "Health check request");

    let allowlist = state.redirect_guard.snapshot();

    Json(json!({
        "status": "healthy",
        "service": "warden-api",
        "challenges_solved": state.challenges.solved_count(),
        "allowlist_entries": allowlist.entries().len(),
        "allowlist_origins": allowlist.origin_count(),
        "correlation_id": correlation_id.to_string()
    }))
}
