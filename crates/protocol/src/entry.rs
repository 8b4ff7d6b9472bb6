//! Listing entries.
//!
//! An [`Entry`] describes one item of a directory listing. Entries only
//! ever carry a base name, never a path, and directories and symlinks
//! always report a size of zero.

use serde::{Deserialize, Serialize};

/// Name of the synthetic entry used for upward navigation.
pub const PARENT_ENTRY_NAME: &str = "..";

/// Type of listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file (or anything that is neither a directory nor a symlink).
    File,
    /// Directory.
    Directory,
    /// Symbolic link, regardless of what it points to.
    Symlink,
}

/// A single item within a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Base file name.
    pub name: String,
    /// Entry type.
    pub kind: EntryKind,
    /// Size in bytes (0 for directories and symlinks).
    pub size: u64,
    /// Last modified timestamp (Unix epoch seconds, 0 if unavailable).
    pub modified_at: u64,
    /// Lowercase extension (empty for directories).
    pub extension: String,
}

impl Entry {
    /// Create an entry, deriving the extension from the name.
    ///
    /// The size is forced to zero for directories and symlinks.
    pub fn new(name: impl Into<String>, kind: EntryKind, size: u64, modified_at: u64) -> Self {
        let name = name.into();
        let extension = match kind {
            EntryKind::Directory => String::new(),
            EntryKind::File | EntryKind::Symlink => extension_of(&name),
        };
        let size = match kind {
            EntryKind::File => size,
            EntryKind::Directory | EntryKind::Symlink => 0,
        };

        Self {
            name,
            kind,
            size,
            modified_at,
            extension,
        }
    }

    /// The synthetic `..` entry prepended to non-root listings.
    pub fn parent() -> Self {
        Self::new(PARENT_ENTRY_NAME, EntryKind::Directory, 0, 0)
    }

    /// Whether this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Whether this is the synthetic parent entry.
    pub fn is_parent(&self) -> bool {
        self.is_dir() && self.name == PARENT_ENTRY_NAME
    }
}

/// Lowercase extension of a file name: everything after the last dot.
///
/// Dotfiles keep their name as the extension (`.bashrc` gives `bashrc`).
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// Result of enumerating a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Entries in display order.
    pub entries: Vec<Entry>,
    /// Number of accepted entries (the synthetic parent entry is not counted).
    pub total: usize,
    /// Sum of sizes over file entries.
    pub total_size: u64,
}

impl Listing {
    /// Append an accepted entry, updating the counters.
    pub fn push(&mut self, entry: Entry) {
        self.total += 1;
        if entry.kind == EntryKind::File {
            self.total_size += entry.size;
        }
        self.entries.push(entry);
    }

    /// Whether the listing has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
