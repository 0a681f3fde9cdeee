//! Shared utilities for the Warden crates
//!
//! Request correlation, environment bootstrap and log-only error sanitization
//! live here so the guard library and the HTTP service agree on them.

pub mod error_sanitizer;
pub mod init;

pub use error_sanitizer::{sanitize_error, sanitize_with_message};
pub use init::initialize_environment;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation ID attached to every request and every error response
///
/// Uses UUID v4 so IDs never collide across server instances
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new correlation ID using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an inbound header value, returning `None` unless it is a UUID
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::try_parse(value.trim()).ok().map(Self)
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Self::parse(id).unwrap_or_default()
    }
}
