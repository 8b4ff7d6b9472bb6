//! Page documents returned for browse requests.
//!
//! A [`BrowsePage`] carries everything a presenter needs to render one
//! directory: the ordered entries with ready-made links and display
//! strings, aggregate counters and optional README contents.

use serde::{Deserialize, Serialize};

use crate::entry::Entry;

/// Units used by [`human_size`].
const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Route prefix under which file contents are served.
pub const FILES_ROUTE: &str = "/files";

/// One row of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    /// The underlying entry.
    #[serde(flatten)]
    pub entry: Entry,
    /// Link target: a browse link for directories, a file link otherwise.
    pub url: String,
    /// Human-readable size, `-` for directories and symlinks.
    pub size_human: String,
    /// Formatted modification time, `-` when unknown.
    pub modified: String,
    /// Whether the file can be previewed inline.
    pub previewable: bool,
}

/// The document returned for a browse request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowsePage {
    /// Configured site title.
    pub site_title: String,
    /// Configured page language.
    pub language: String,
    /// Display path (`/` for the root).
    pub path: String,
    /// Effective browse path (empty for the root).
    pub browse_path: String,
    /// Number of entries, excluding the parent entry.
    pub total: usize,
    /// Aggregate size of file entries.
    pub total_size: u64,
    /// Human-readable aggregate size.
    pub total_size_human: String,
    /// Whether zip-on-demand downloads are offered.
    pub zip_downloads: bool,
    /// Contents of the directory's README, if displayed.
    pub readme: Option<String>,
    /// Rows in display order.
    pub entries: Vec<PageEntry>,
}

/// Format a byte count with one decimal.
///
/// The unit is picked from the number of decimal digits (one unit per
/// three digits) and the value is then divided by the matching power of
/// 1024, so `1000` renders as `1.0 KB`.
pub fn human_size(bytes: u64) -> String {
    let digits = bytes.to_string().len();
    let factor = ((digits - 1) / 3).min(SIZE_UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(factor as i32);
    format!("{:.1} {}", value, SIZE_UNITS[factor])
}

/// Link that browses to `browse_path`.
pub fn browse_url(browse_path: &str) -> String {
    format!("/?b={}", urlencoding::encode(browse_path))
}

/// Link that serves the file `name` inside `browse_path`.
pub fn file_url(browse_path: &str, name: &str) -> String {
    let mut url = String::from(FILES_ROUTE);
    for segment in browse_path
        .split('/')
        .chain(std::iter::once(name))
        .filter(|s| !s.is_empty())
    {
        url.push('/');
        url.push_str(&urlencoding::encode(segment));
    }
    url
}

/// Browse path one level up (empty at the top level).
pub fn parent_of(browse_path: &str) -> &str {
    match browse_path.rsplit_once('/') {
        Some((parent, _)) => parent,
        None => "",
    }
}
