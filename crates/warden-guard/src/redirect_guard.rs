//! Open-redirect protection
//!
//! A redirect target is permitted when it is an application-relative path, or
//! an absolute `http`/`https` URL whose origin exactly equals the origin of an
//! allowlist entry. Origins are compared as (scheme, host, port) tuples, never
//! as strings, so `https://example.com.attacker.net` does not ride on an
//! `https://example.com` entry.

use crate::error::FailureKind;
use crate::observer::{NoopObserver, RedirectObserver, RedirectReport};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, warn};
use url::{Origin, Url};

/// Why a redirect target was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Empty,
    Malformed,
    UnsupportedScheme,
    OriginNotAllowed,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Empty => "empty target",
            Self::Malformed => "not an absolute URL",
            Self::UnsupportedScheme => "scheme is not http or https",
            Self::OriginNotAllowed => "origin is not allowlisted",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedirectError {
    #[error("Unrecognized target URL for redirect: {target}")]
    Unrecognized { target: String, reason: RejectReason },
}

impl RedirectError {
    fn unrecognized(target: &str, reason: RejectReason) -> Self {
        Self::Unrecognized {
            target: target.to_string(),
            reason,
        }
    }

    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Unrecognized { .. } => FailureKind::Unrecognized,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::Unrecognized { target, .. } => target,
        }
    }

    pub const fn reason(&self) -> RejectReason {
        match self {
            Self::Unrecognized { reason, .. } => *reason,
        }
    }
}

/// A redirect that passed validation
///
/// `target` is the caller's string, unmodified; it is what goes into `Location`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermittedRedirect {
    target: String,
    relative: bool,
}

impl PermittedRedirect {
    pub fn target(&self) -> &str {
        &self.target
    }

    /// True for application-relative paths
    pub const fn is_relative(&self) -> bool {
        self.relative
    }

    pub fn into_target(self) -> String {
        self.target
    }
}

/// Configured redirect destinations and the origins derived from them
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    entries: Vec<String>,
    origins: HashSet<Origin>,
}

impl Allowlist {
    /// Build from full URLs; entries without an `http`/`https` origin are
    /// kept for prefix reporting but never match an origin
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<String> = entries.into_iter().map(Into::into).collect();
        let origins = entries
            .iter()
            .filter_map(|entry| match Url::parse(entry) {
                Ok(url) if is_web_scheme(url.scheme()) => Some(url.origin()),
                _ => {
                    warn!(entry = %entry, "Skipping redirect allowlist entry without an http(s) origin");
                    None
                }
            })
            .collect();

        Self { entries, origins }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn origin_count(&self) -> usize {
        self.origins.len()
    }

    pub fn allows_origin(&self, origin: &Origin) -> bool {
        self.origins.contains(origin)
    }

    /// No raw entry is a string prefix of `target`
    pub fn is_outside(&self, target: &str) -> bool {
        !self.entries.iter().any(|entry| target.starts_with(entry.as_str()))
    }
}

/// Decide whether redirecting to `target` is allowed
///
/// # Errors
///
/// Returns `RedirectError::Unrecognized` if the target is empty, is neither an
/// application-relative path nor an absolute URL, uses a scheme other than
/// `http`/`https`, or has an origin that is not allowlisted
pub fn validate_redirect(
    target: &str,
    allowlist: &Allowlist,
) -> Result<PermittedRedirect, RedirectError> {
    if target.is_empty() {
        return Err(RedirectError::unrecognized(target, RejectReason::Empty));
    }

    if is_application_relative(target) {
        return Ok(PermittedRedirect {
            target: target.to_string(),
            relative: true,
        });
    }

    let parsed = Url::parse(target).map_err(|e| {
        debug!(redirect_target = %target, error = %e, "Redirect target is not an absolute URL");
        RedirectError::unrecognized(target, RejectReason::Malformed)
    })?;

    if !is_web_scheme(parsed.scheme()) {
        return Err(RedirectError::unrecognized(
            target,
            RejectReason::UnsupportedScheme,
        ));
    }

    if !allowlist.allows_origin(&parsed.origin()) {
        return Err(RedirectError::unrecognized(
            target,
            RejectReason::OriginNotAllowed,
        ));
    }

    Ok(PermittedRedirect {
        target: target.to_string(),
        relative: false,
    })
}

/// One leading `/` followed by anything but another separator
///
/// `//host` and `/\host` are scheme-relative to browsers. Control characters
/// are refused because browsers strip tabs and newlines, turning `/\t/host`
/// into `//host`.
fn is_application_relative(target: &str) -> bool {
    let mut bytes = target.bytes();
    bytes.next() == Some(b'/')
        && !matches!(bytes.next(), Some(b'/' | b'\\'))
        && !target.chars().any(|c| c.is_ascii_control())
}

fn is_web_scheme(scheme: &str) -> bool {
    matches!(scheme, "http" | "https")
}

/// Redirect validation bound to a reloadable allowlist and an observer
pub struct RedirectGuard {
    allowlist: RwLock<Arc<Allowlist>>,
    observer: Arc<dyn RedirectObserver>,
}

impl RedirectGuard {
    pub fn new(allowlist: Allowlist) -> Self {
        Self::with_observer(allowlist, Arc::new(NoopObserver))
    }

    pub fn with_observer(allowlist: Allowlist, observer: Arc<dyn RedirectObserver>) -> Self {
        Self {
            allowlist: RwLock::new(Arc::new(allowlist)),
            observer,
        }
    }

    /// Validate `target` against the current allowlist
    ///
    /// The observer runs only after the decision is final and only for
    /// permitted redirects.
    ///
    /// # Errors
    ///
    /// See [`validate_redirect`]
    pub fn validate(&self, target: &str) -> Result<PermittedRedirect, RedirectError> {
        let allowlist = self.snapshot();
        let decision = validate_redirect(target, &allowlist);

        if let Ok(permitted) = &decision {
            self.observer
                .on_permitted(&RedirectReport::new(permitted, &allowlist));
        }

        decision
    }

    /// Replace the allowlist; in-flight validations keep their snapshot
    pub fn reload(&self, allowlist: Allowlist) {
        let mut current = self
            .allowlist
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(allowlist);
    }

    pub fn snapshot(&self) -> Arc<Allowlist> {
        let current = self.allowlist.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }
}

impl fmt::Debug for RedirectGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedirectGuard")
            .field("allowlist", &self.snapshot())
            .finish_non_exhaustive()
    }
}
