//! Browse path resolution against the configured root.
//!
//! A requested browse path is first normalized textually and then
//! canonicalized through the filesystem. The canonical result must lie
//! inside the canonical root; anything else falls back to the root itself.
//!
//! The textual step only removes literal `/../` and `/..` substrings. It is
//! not a normalization and can be bypassed (a leading `../` survives it, for
//! instance). The canonicalization and prefix check are what keep requests
//! inside the root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Reasons a browse path is not used. Never surfaced to clients.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The canonical path lies outside the root.
    #[error("path escapes the root: {0}")]
    TraversalRejected(PathBuf),

    /// The requested path does not exist.
    #[error("path does not exist: {0}")]
    NotFound(PathBuf),

    /// The requested path is not a directory.
    #[error("path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A resolved browse request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Canonical absolute directory.
    pub dir: PathBuf,
    /// Effective browse path relative to the root (empty for the root).
    pub browse_path: String,
}

impl ResolvedPath {
    /// Whether this resolves to the root itself.
    pub fn is_root(&self) -> bool {
        self.browse_path.is_empty()
    }
}

/// Sandboxes browse paths against a root directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Canonical root.
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for `root`, canonicalizing it once.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ResolveError> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ResolveError::NotFound(root.to_path_buf())
            } else {
                ResolveError::Io(e)
            }
        })?;

        if !canonical.is_dir() {
            return Err(ResolveError::NotADirectory(canonical));
        }

        Ok(Self { root: canonical })
    }

    /// The canonical root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a requested browse path.
    ///
    /// Never fails: any invalid request resolves to the root with an empty
    /// browse path.
    pub fn resolve(&self, requested: &str) -> ResolvedPath {
        let browse_path = normalize(requested);
        if browse_path.is_empty() {
            return self.root_path();
        }

        match self.try_resolve(&browse_path) {
            Ok(dir) => ResolvedPath { dir, browse_path },
            Err(e) => {
                tracing::debug!("Falling back to root for {:?}: {}", requested, e);
                self.root_path()
            }
        }
    }

    /// Resolve `relative` to a canonical path inside the root.
    ///
    /// Unlike [`PathResolver::resolve`] the target may be a file and failures
    /// are reported.
    pub fn contain(&self, relative: &str) -> Result<PathBuf, ResolveError> {
        let candidate = self.root.join(relative.trim_start_matches('/'));
        let canonical = fs::canonicalize(&candidate).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ResolveError::NotFound(candidate.clone())
            } else {
                ResolveError::Io(e)
            }
        })?;

        if !canonical.starts_with(&self.root) {
            return Err(ResolveError::TraversalRejected(canonical));
        }

        Ok(canonical)
    }

    fn try_resolve(&self, browse_path: &str) -> Result<PathBuf, ResolveError> {
        let canonical = self.contain(browse_path)?;
        if !canonical.is_dir() {
            return Err(ResolveError::NotADirectory(canonical));
        }
        Ok(canonical)
    }

    fn root_path(&self) -> ResolvedPath {
        ResolvedPath {
            dir: self.root.clone(),
            browse_path: String::new(),
        }
    }
}

/// Textual normalization of a requested browse path.
///
/// Backslashes become slashes, slashes and spaces are trimmed from both
/// ends, then every `/../` and afterwards every `/..` substring is removed.
pub fn normalize(requested: &str) -> String {
    let path = requested.replace('\\', "/");
    let path = path.trim_matches(|c| c == '/' || c == ' ');
    path.replace("/../", "").replace("/..", "")
}
