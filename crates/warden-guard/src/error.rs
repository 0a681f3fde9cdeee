//! Failure taxonomy shared by both guards

use std::fmt;

/// Classification of every guard failure
///
/// Each kind maps to exactly one HTTP status. Hosts decide the response from
/// the kind alone; the underlying I/O or parse error is for logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Malformed request data (client fault)
    InvalidInput,
    /// Server misconfiguration (operator fault)
    Configuration,
    /// Target absent or not a regular file
    NotFound,
    /// Target exists but lies outside the trust boundary
    Forbidden,
    /// Redirect target not on the allowlist or malformed
    Unrecognized,
}

impl FailureKind {
    /// HTTP status code for this failure
    pub const fn status_code(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::Configuration => 500,
            Self::NotFound => 404,
            Self::Forbidden => 403,
            Self::Unrecognized => 406,
        }
    }

    /// Whether the failure is the client's fault
    pub const fn is_client_error(self) -> bool {
        !matches!(self, Self::Configuration)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidInput => "invalid_input",
            Self::Configuration => "configuration_error",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Unrecognized => "unrecognized",
        };
        f.write_str(name)
    }
}
