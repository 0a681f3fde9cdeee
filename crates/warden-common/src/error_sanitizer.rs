//! Error sanitization for client-facing messages
//!
//! Filesystem and URL-parsing failures carry paths and parser internals that
//! must never reach an HTTP client. The detailed error goes to the log under a
//! correlation ID and the client only sees the reference.

use crate::CorrelationId;
use tracing::error;

/// Log `error` under `correlation_id` and return a generic client message
pub fn sanitize_error<E: std::fmt::Display>(
    error: E,
    context: &str,
    correlation_id: &CorrelationId,
) -> String {
    error!(
        correlation_id = %correlation_id,
        error = %error,
        context = %context,
        "Internal error occurred"
    );

    format!("Operation failed (ref: {correlation_id})")
}

/// Log `error` under `correlation_id` and return `user_message` with the reference
pub fn sanitize_with_message<E: std::fmt::Display>(
    error: E,
    context: &str,
    user_message: &str,
    correlation_id: &CorrelationId,
) -> String {
    error!(
        correlation_id = %correlation_id,
        error = %error,
        context = %context,
        "Internal error occurred"
    );

    format!("{user_message} (ref: {correlation_id})")
}
