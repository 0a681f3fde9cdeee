//! Request correlation middleware
//!
//! Every request gets a [`CorrelationId`]: the caller's `X-Correlation-ID`
//! when it is a valid UUID, otherwise a fresh one. Handlers read it from the
//! [`RequestContext`] extension and the same value is echoed on the response.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use warden_common::CorrelationId;

/// Header carrying the correlation ID in both directions
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Per-request data inserted by [`correlation_id_middleware`]
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: CorrelationId,
}

impl RequestContext {
    /// Correlation ID from an optional extension, fresh if the middleware did not run
    pub fn correlation_id_or_new(context: Option<&Self>) -> CorrelationId {
        context.map_or_else(CorrelationId::new, |ctx| ctx.correlation_id.clone())
    }
}

pub async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(CorrelationId::parse)
        .unwrap_or_default();

    request.extensions_mut().insert(RequestContext {
        correlation_id: correlation_id.clone(),
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    response
}
