//! Structured API error handling for the Warden API.
//!
//! Every guard failure becomes exactly one `ApiError`, and every `ApiError`
//! becomes exactly one HTTP status. The status is decided by the guard's
//! [`FailureKind`]; underlying I/O or parse errors only ever reach the logs.
//!
//! # Usage
//!
//! ```rust
//! use warden_api::{ApiError, ApiResult};
//! use warden_common::CorrelationId;
//!
//! fn lookup() -> ApiResult<()> {
//!     Err(ApiError::NotFound {
//!         correlation_id: CorrelationId::new(),
//!     })
//! }
//! ```

use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use warden_common::{CorrelationId, sanitize_with_message};
use warden_guard::{FailureKind, PathGuardError, RedirectError};

use crate::middleware::CORRELATION_ID_HEADER;

/// API errors, each carrying the correlation ID of the failing request
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request data, e.g. an empty file name or one containing NUL.
    #[error("{message} (correlation: {correlation_id})")]
    InvalidInput {
        message: String,
        correlation_id: CorrelationId,
    },

    /// The server is misconfigured; `message` is already sanitized.
    #[error("{message}")]
    Configuration {
        message: String,
        correlation_id: CorrelationId,
    },

    /// Requested file does not exist or is not a regular file.
    #[error("Not found (correlation: {correlation_id})")]
    NotFound { correlation_id: CorrelationId },

    /// Requested file lies outside the quarantine directory.
    #[error("Access denied (correlation: {correlation_id})")]
    Forbidden { correlation_id: CorrelationId },

    /// Redirect target is not allowlisted.
    #[error("Unrecognized target URL for redirect: {target} (correlation: {correlation_id})")]
    UnrecognizedRedirect {
        target: String,
        correlation_id: CorrelationId,
    },

    /// Unexpected failure after validation succeeded.
    #[error("Internal server error (correlation: {correlation_id})")]
    InternalServerError { correlation_id: CorrelationId },
}

/// Error response sent to API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Correlation ID for tracking and support
    pub correlation_id: CorrelationId,
}

impl ApiError {
    /// Classify a quarantine lookup failure
    pub fn from_path_error(err: &PathGuardError, correlation_id: CorrelationId) -> Self {
        match err.kind() {
            FailureKind::InvalidInput => Self::InvalidInput {
                message: err.to_string(),
                correlation_id,
            },
            FailureKind::Configuration => Self::Configuration {
                message: sanitize_with_message(
                    DisplayChain(err),
                    "quarantine_base_dir",
                    "Quarantine storage is unavailable",
                    &correlation_id,
                ),
                correlation_id,
            },
            FailureKind::Forbidden => Self::Forbidden { correlation_id },
            FailureKind::NotFound | FailureKind::Unrecognized => Self::NotFound { correlation_id },
        }
    }

    /// Classify a redirect rejection
    pub fn from_redirect_error(err: RedirectError, correlation_id: CorrelationId) -> Self {
        Self::UnrecognizedRedirect {
            target: err.target().to_string(),
            correlation_id,
        }
    }

    /// Get the correlation ID from any error variant.
    pub const fn correlation_id(&self) -> &CorrelationId {
        match self {
            Self::InvalidInput { correlation_id, .. }
            | Self::Configuration { correlation_id, .. }
            | Self::NotFound { correlation_id }
            | Self::Forbidden { correlation_id }
            | Self::UnrecognizedRedirect { correlation_id, .. }
            | Self::InternalServerError { correlation_id } => correlation_id,
        }
    }

    /// Get the HTTP status code for this error.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::UnrecognizedRedirect { .. } => StatusCode::NOT_ACCEPTABLE,
            Self::Configuration { .. } | Self::InternalServerError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable error code for the JSON body
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::UnrecognizedRedirect { .. } => "UNRECOGNIZED",
            Self::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// Formats an error with its `source()` chain for log lines
struct DisplayChain<'a>(&'a (dyn std::error::Error + 'static));

impl std::fmt::Display for DisplayChain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, ": {err}")?;
            source = err.source();
        }
        Ok(())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let correlation_id = self.correlation_id().clone();

        if status.is_server_error() {
            error!(correlation_id = %correlation_id, error = %self, "Server error");
        } else {
            warn!(correlation_id = %correlation_id, error = %self, "Client error");
        }

        let error_response = ApiErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
            correlation_id: correlation_id.clone(),
        };

        let mut response = (status, Json(error_response)).into_response();

        if let Ok(header_value) = HeaderValue::from_str(&correlation_id.to_string()) {
            response
                .headers_mut()
                .insert(CORRELATION_ID_HEADER, header_value);
        }

        response
    }
}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
