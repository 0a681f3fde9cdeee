//! `GET /quarantine/{file}`
//!
//! Resolution runs on the blocking pool because it stats and canonicalizes.
//! Only a path returned by the guard is ever opened.

use std::sync::Arc;

use axum::{
    Extension, Router,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
    routing::get,
};
use tokio_util::io::ReaderStream;
use tracing::{error, info, instrument};
use warden_common::sanitize_error;

use crate::{ApiError, ApiResult, AppState, middleware::RequestContext};

pub fn routes() -> Router<AppState> {
    Router::new().route("/quarantine/{file}", get(serve_quarantine_file))
}

#[instrument(skip_all, fields(correlation_id, file))]
async fn serve_quarantine_file(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    Path(file): Path<String>,
) -> ApiResult<Response> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    let span = tracing::Span::current();
    span.record("correlation_id", correlation_id.to_string());
    span.record("file", file.as_str());

    let guard = Arc::clone(&state.path_guard);
    let resolved = tokio::task::spawn_blocking(move || guard.resolve(&file))
        .await
        .map_err(|e| {
            error!(correlation_id = %correlation_id, error = %e, "Quarantine lookup task failed");
            ApiError::InternalServerError {
                correlation_id: correlation_id.clone(),
            }
        })?;

    let safe_file =
        resolved.map_err(|e| ApiError::from_path_error(&e, correlation_id.clone()))?;

    let handle = tokio::fs::File::open(safe_file.path())
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                // Removed between resolution and open
                ApiError::NotFound {
                    correlation_id: correlation_id.clone(),
                }
            } else {
                sanitize_error(&e, "quarantine_open", &correlation_id);
                ApiError::InternalServerError {
                    correlation_id: correlation_id.clone(),
                }
            }
        })?;

    // Length comes from the open handle so the header matches the bytes streamed
    let metadata = handle.metadata().await.map_err(|e| {
        sanitize_error(&e, "quarantine_metadata", &correlation_id);
        ApiError::InternalServerError {
            correlation_id: correlation_id.clone(),
        }
    })?;
    if !metadata.is_file() {
        return Err(ApiError::NotFound { correlation_id });
    }
    let len = metadata.len();

    info!(
        correlation_id = %correlation_id,
        bytes = len,
        "Serving quarantine file"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, len)
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(Body::from_stream(ReaderStream::new(handle)))
        .map_err(|e| {
            sanitize_error(&e, "quarantine_response", &correlation_id);
            ApiError::InternalServerError { correlation_id }
        })
}
