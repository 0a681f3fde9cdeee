//! `GET /redirect?to=<target>`
//!
//! Permitted targets get a `302 Found` with the target unchanged in
//! `Location`. Everything else is a `406`.

use axum::{
    Extension, Router,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::{ApiError, ApiResult, AppState, middleware::RequestContext};

/// Query parameters; a missing `to` is treated as an empty target
#[derive(Debug, Deserialize)]
pub struct RedirectParams {
    pub to: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/redirect", get(perform_redirect))
}

#[instrument(skip_all, fields(correlation_id))]
async fn perform_redirect(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    Query(params): Query<RedirectParams>,
) -> ApiResult<Response> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    tracing::Span::current().record("correlation_id", correlation_id.to_string());

    let target = params.to.unwrap_or_default();
    let permitted = state
        .redirect_guard
        .validate(&target)
        .map_err(|e| {
            debug!(correlation_id = %correlation_id, reason = %e.reason(), "Redirect rejected");
            ApiError::from_redirect_error(e, correlation_id.clone())
        })?;

    // The URL parser drops embedded newlines that a header value cannot carry
    let location = HeaderValue::from_str(permitted.target()).map_err(|_| {
        ApiError::UnrecognizedRedirect {
            target: permitted.target().to_string(),
            correlation_id: correlation_id.clone(),
        }
    })?;

    info!(
        correlation_id = %correlation_id,
        relative = permitted.is_relative(),
        "Redirecting"
    );

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
