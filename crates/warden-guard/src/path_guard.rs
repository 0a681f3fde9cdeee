//! Quarantine file resolution
//!
//! Turns an untrusted file name into the canonical path of a regular file that
//! is guaranteed to live inside the quarantine directory at the moment of the
//! check. Containment is decided on real, symlink-resolved paths; a lexical
//! check alone would let a symlink inside the directory point anywhere.
//!
//! The filesystem can change between the check and the read (TOCTOU). That
//! window is accepted; nothing here is cached, so every request re-checks.

use crate::error::FailureKind;
use std::fs;
use std::io;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a quarantine lookup failed
#[derive(Debug, Error)]
pub enum PathGuardError {
    /// Empty name or embedded NUL
    #[error("Invalid file name: {reason}")]
    InvalidInput { reason: &'static str },

    /// The base directory cannot be resolved
    #[error("Quarantine directory {} is unavailable", base_dir.display())]
    Configuration {
        base_dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Nothing resolvable at that name, or not a regular file
    #[error("Not found")]
    NotFound { candidate: String },

    /// Resolves outside the quarantine directory
    #[error("Access denied")]
    Forbidden { candidate: String },
}

impl PathGuardError {
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput { .. } => FailureKind::InvalidInput,
            Self::Configuration { .. } => FailureKind::Configuration,
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Forbidden { .. } => FailureKind::Forbidden,
        }
    }
}

/// A regular file verified to be inside the quarantine directory
///
/// Only [`PathGuard::resolve`] and [`resolve_quarantine_file`] construct it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeFile {
    path: PathBuf,
    len: u64,
}

impl SafeFile {
    /// Canonical absolute path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size observed during resolution
    pub const fn len(&self) -> u64 {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn into_inner(self) -> PathBuf {
        self.path
    }
}

impl Deref for SafeFile {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.path
    }
}

impl AsRef<Path> for SafeFile {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Resolves file names against one configured quarantine directory
#[derive(Debug, Clone)]
pub struct PathGuard {
    base_dir: PathBuf,
}

impl PathGuard {
    /// The directory is not touched here; it is canonicalized on every
    /// [`resolve`](Self::resolve) so a moved or re-linked directory is noticed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve `candidate` to a regular file inside the base directory
    ///
    /// # Errors
    ///
    /// See [`resolve_quarantine_file`]
    pub fn resolve(&self, candidate: &str) -> Result<SafeFile, PathGuardError> {
        resolve_quarantine_file(&self.base_dir, candidate)
    }
}

/// Resolve an untrusted `candidate` to a regular file inside `base_dir`
///
/// # Errors
///
/// - `InvalidInput` if the name is empty or contains NUL
/// - `Configuration` if `base_dir` cannot be canonicalized
/// - `Forbidden` if the name escapes the directory, lexically or via symlinks
/// - `NotFound` if nothing resolvable exists there, or it is not a regular file
pub fn resolve_quarantine_file(base_dir: &Path, candidate: &str) -> Result<SafeFile, PathGuardError> {
    if candidate.is_empty() {
        return Err(PathGuardError::InvalidInput {
            reason: "file name is empty",
        });
    }
    if candidate.contains('\0') {
        return Err(PathGuardError::InvalidInput {
            reason: "file name contains a NUL character",
        });
    }

    let real_base = fs::canonicalize(base_dir).map_err(|source| {
        warn!(base_dir = %base_dir.display(), error = %source, "Cannot resolve quarantine directory");
        PathGuardError::Configuration {
            base_dir: base_dir.to_path_buf(),
            source,
        }
    })?;

    // Ordinary join: an absolute candidate replaces the base entirely
    let joined = normalize_path(&real_base.join(candidate));

    // Refuse lexical escapes before touching the target, so 403/404 never
    // reveals whether a file exists outside the directory
    if !is_contained(&joined, &real_base) {
        warn!(candidate, "Quarantine request escapes base directory");
        return Err(PathGuardError::Forbidden {
            candidate: candidate.to_string(),
        });
    }

    let real_resolved = match fs::canonicalize(&joined) {
        Ok(path) => path,
        Err(e) => {
            debug!(candidate, error = %e, "Quarantine file does not resolve");
            return Err(PathGuardError::NotFound {
                candidate: candidate.to_string(),
            });
        }
    };

    if !is_contained(&real_resolved, &real_base) {
        warn!(
            candidate,
            resolved = %real_resolved.display(),
            "Quarantine symlink points outside base directory"
        );
        return Err(PathGuardError::Forbidden {
            candidate: candidate.to_string(),
        });
    }

    // Directories, devices and FIFOs all look like "not found" to the client
    let metadata = match fs::metadata(&real_resolved) {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => {
            debug!(candidate, "Quarantine entry is not a regular file");
            return Err(PathGuardError::NotFound {
                candidate: candidate.to_string(),
            });
        }
        Err(e) => {
            debug!(candidate, error = %e, "Cannot stat quarantine file");
            return Err(PathGuardError::NotFound {
                candidate: candidate.to_string(),
            });
        }
    };

    Ok(SafeFile {
        path: real_resolved,
        len: metadata.len(),
    })
}

/// `path` equals `base` or lies beneath it
///
/// Component-wise, so `/srv/quarantine-old` is not inside `/srv/quarantine`.
fn is_contained(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

/// Normalize a path by resolving . and .. components without filesystem access
fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if let Some(last) = components.last()
                    && matches!(last, Component::Normal(_))
                {
                    components.pop();
                }
            }
            c => components.push(c),
        }
    }

    components.iter().collect()
}
