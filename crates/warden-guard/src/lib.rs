//! Boundary checks for untrusted request input
//!
//! - [`PathGuard`] resolves a user-supplied file name to a regular file inside
//!   the quarantine directory, defeating `..` traversal and symlink escapes.
//! - [`RedirectGuard`] decides whether a user-supplied redirect target is
//!   allowed, defeating open redirects.
//!
//! Both are stateless per call and independent of each other. Failures are
//! classified by [`FailureKind`], which carries the HTTP status to use.

pub mod error;
pub mod observer;
pub mod path_guard;
pub mod redirect_guard;

pub use error::FailureKind;
pub use observer::{
    CRYPTO_DECOY_URLS, Challenge, ChallengeTracker, NoopObserver, RedirectObserver,
    RedirectReport,
};
pub use path_guard::{PathGuard, PathGuardError, SafeFile, resolve_quarantine_file};
pub use redirect_guard::{
    Allowlist, PermittedRedirect, RedirectError, RedirectGuard, RejectReason, validate_redirect,
};
