//! Directory browsing with path validation.
//!
//! This module reads the direct children of a resolved directory, filters
//! and classifies them, and assembles the per-request [`BrowseContext`].
//! Failures never abort a listing: an unreadable directory yields an empty
//! listing and an entry that cannot be stat'ed is kept with zeroed metadata.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use dirbrowse_protocol::{Entry, EntryKind, Listing, SortOrder};

use super::resolver::PathResolver;
use super::sort;

/// Which entries are left out of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    /// Skip names starting with a dot.
    pub hide_dot_files: bool,
    /// Exact names to skip.
    pub ignore_names: HashSet<String>,
}

impl ListingFilter {
    /// Whether an entry with this name belongs in a listing.
    pub fn accepts(&self, name: &str) -> bool {
        if name == "." || name == ".." {
            return false;
        }
        if self.hide_dot_files && name.starts_with('.') {
            return false;
        }
        !self.ignore_names.contains(name)
    }
}

/// List the direct children of `dir`.
///
/// Entries are classified symlink first, then directory, else file, using
/// metadata that does not follow symlinks. The result is in directory
/// order; see [`sort`] for ordering.
pub fn enumerate(dir: &Path, filter: &ListingFilter) -> Listing {
    let mut listing = Listing::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot open directory {}: {}", dir.display(), e);
            return listing;
        }
    };

    for entry_result in entries {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().to_string();
        if !filter.accepts(&name) {
            continue;
        }

        listing.push(read_entry(&entry, name));
    }

    listing
}

/// Build an entry from a directory entry without following symlinks.
fn read_entry(entry: &fs::DirEntry, name: String) -> Entry {
    let metadata = match fs::symlink_metadata(entry.path()) {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::debug!("Cannot stat {}: {}", entry.path().display(), e);
            None
        }
    };

    // Fall back to the type reported by the directory read itself
    let file_type = match &metadata {
        Some(m) => Some(m.file_type()),
        None => entry.file_type().ok(),
    };

    let kind = match file_type {
        Some(t) if t.is_symlink() => EntryKind::Symlink,
        Some(t) if t.is_dir() => EntryKind::Directory,
        _ => EntryKind::File,
    };

    let size = metadata.as_ref().map(|m| m.len()).unwrap_or(0);
    let modified_at = metadata
        .as_ref()
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Entry::new(name, kind, size, modified_at)
}

/// Everything known about one browse request.
///
/// Created per request and discarded once the response is built.
#[derive(Debug, Clone)]
pub struct BrowseContext {
    /// Canonical directory being listed.
    pub dir: PathBuf,
    /// Effective browse path (empty for the root).
    pub browse_path: String,
    /// Filtered and ordered entries.
    pub listing: Listing,
}

impl BrowseContext {
    /// Whether the root is being listed.
    pub fn is_root(&self) -> bool {
        self.browse_path.is_empty()
    }
}

/// Directory browser bound to one root and one entry filter.
#[derive(Debug, Clone)]
pub struct DirectoryBrowser {
    resolver: PathResolver,
    filter: ListingFilter,
}

impl DirectoryBrowser {
    /// Create a browser.
    pub fn new(resolver: PathResolver, filter: ListingFilter) -> Self {
        Self { resolver, filter }
    }

    /// The resolver used for browse paths.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// The entry filter.
    pub fn filter(&self) -> &ListingFilter {
        &self.filter
    }

    /// Resolve, enumerate and order one browse request.
    pub fn browse(&self, requested: &str, order: SortOrder) -> BrowseContext {
        let resolved = self.resolver.resolve(requested);
        let listing = enumerate(&resolved.dir, &self.filter);
        let listing = sort::arrange(listing, order, !resolved.is_root());

        tracing::debug!(
            "Listed {:?} ({} entries, {} bytes)",
            resolved.browse_path,
            listing.total,
            listing.total_size
        );

        BrowseContext {
            dir: resolved.dir,
            browse_path: resolved.browse_path,
            listing,
        }
    }
}
