//! Page assembly.
//!
//! Turns a [`BrowseContext`] into the [`BrowsePage`] document sent to
//! clients: links, display sizes, formatted times and README contents.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use dirbrowse_protocol::{
    browse_url, file_url, human_size, parent_of, BrowsePage, Entry, EntryKind, PageEntry,
};

use crate::config::Config;
use crate::files::BrowseContext;

/// README file shown below a listing.
const README_NAME: &str = "README.md";

/// Presentation settings taken from the configuration.
#[derive(Debug, Clone)]
pub struct PageSettings {
    pub site_title: String,
    pub language: String,
    pub date_format: String,
    pub display_readmes: bool,
    pub zip_downloads: bool,
    /// Lowercase extensions previewable inline.
    pub preview_types: HashSet<String>,
}

impl PageSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            site_title: config.listing.site_title.clone(),
            language: config.listing.language.clone(),
            date_format: config.listing.date_format.clone(),
            display_readmes: config.files.display_readmes,
            zip_downloads: config.files.zip_downloads,
            preview_types: config
                .files
                .preview_types
                .iter()
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }
}

/// Build the page for one browse request.
///
/// `root` is the canonical root; a README resolving outside it is not read.
pub fn build_page(context: &BrowseContext, settings: &PageSettings, root: &Path) -> BrowsePage {
    let entries = context
        .listing
        .entries
        .iter()
        .map(|entry| page_entry(entry, context, settings, root))
        .collect();

    let readme = if settings.display_readmes {
        read_readme(&context.dir, root)
    } else {
        None
    };

    let path = if context.is_root() {
        "/".to_string()
    } else {
        context.browse_path.clone()
    };

    BrowsePage {
        site_title: settings.site_title.clone(),
        language: settings.language.clone(),
        path,
        browse_path: context.browse_path.clone(),
        total: context.listing.total,
        total_size: context.listing.total_size,
        total_size_human: human_size(context.listing.total_size),
        zip_downloads: settings.zip_downloads,
        readme,
        entries,
    }
}

fn page_entry(
    entry: &Entry,
    context: &BrowseContext,
    settings: &PageSettings,
    root: &Path,
) -> PageEntry {
    let browse_path = context.browse_path.as_str();
    let browsable = entry.is_dir()
        || (entry.kind == EntryKind::Symlink && links_to_directory(&context.dir, &entry.name, root));

    let url = if entry.is_parent() {
        browse_url(parent_of(browse_path))
    } else if browsable {
        browse_url(&join(browse_path, &entry.name))
    } else {
        file_url(browse_path, &entry.name)
    };

    let size_human = match entry.kind {
        EntryKind::File => human_size(entry.size),
        EntryKind::Directory | EntryKind::Symlink => "-".to_string(),
    };

    PageEntry {
        url,
        size_human,
        modified: format_time(entry.modified_at, &settings.date_format),
        previewable: !browsable && settings.preview_types.contains(&entry.extension),
        entry: entry.clone(),
    }
}

/// Whether the symlink `dir/name` leads to a directory inside the root.
fn links_to_directory(dir: &Path, name: &str, root: &Path) -> bool {
    match fs::canonicalize(dir.join(name)) {
        Ok(target) => target.starts_with(root) && target.is_dir(),
        Err(_) => false,
    }
}

fn join(browse_path: &str, name: &str) -> String {
    if browse_path.is_empty() {
        name.to_string()
    } else {
        format!("{browse_path}/{name}")
    }
}

/// Format an epoch timestamp in local time, `-` when unknown.
pub fn format_time(secs: u64, format: &str) -> String {
    if secs == 0 {
        return "-".to_string();
    }

    let Some(utc) = i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
    else {
        return "-".to_string();
    };

    let mut out = String::new();
    if write!(out, "{}", utc.with_timezone(&Local).format(format)).is_err() {
        return "-".to_string();
    }
    out
}

fn read_readme(dir: &Path, root: &Path) -> Option<String> {
    let path = fs::canonicalize(dir.join(README_NAME)).ok()?;
    if !path.starts_with(root) || !path.is_file() {
        return None;
    }

    match fs::read_to_string(&path) {
        Ok(contents) => Some(contents),
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::{DirectoryBrowser, ListingFilter, PathResolver};
    use dirbrowse_protocol::{SortKey, SortOrder};
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    fn settings() -> PageSettings {
        PageSettings::from_config(&Config::default())
    }

    fn browse(root: &Path, requested: &str) -> (BrowseContext, std::path::PathBuf) {
        let resolver = PathResolver::new(root).unwrap();
        let canonical_root = resolver.root().to_path_buf();
        let browser = DirectoryBrowser::new(resolver, ListingFilter::default());
        (
            browser.browse(requested, SortOrder::new(SortKey::Type, false)),
            canonical_root,
        )
    }

    #[test]
    fn test_root_page() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("sub")).unwrap();
        fs::write(temp_dir.path().join("photo.PNG"), vec![0u8; 1536]).unwrap();

        let (context, root) = browse(temp_dir.path(), "");
        let page = build_page(&context, &settings(), &root);

        assert_eq!(page.path, "/");
        assert_eq!(page.browse_path, "");
        assert_eq!(page.total, 2);
        assert_eq!(page.total_size, 1536);
        assert_eq!(page.total_size_human, "1.5 KB");
        assert_eq!(page.site_title, "Directory Listing");

        let sub = &page.entries[0];
        assert_eq!(sub.entry.name, "sub");
        assert_eq!(sub.url, "/?b=sub");
        assert_eq!(sub.size_human, "-");
        assert!(!sub.previewable);

        let photo = &page.entries[1];
        assert_eq!(photo.url, "/files/photo.PNG");
        assert_eq!(photo.size_human, "1.5 KB");
        assert!(photo.previewable);
        assert_ne!(photo.modified, "-");
    }

    #[test]
    fn test_nested_page_links() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("a/b/c")).unwrap();
        fs::write(temp_dir.path().join("a/b/my notes.txt"), "x").unwrap();

        let (context, root) = browse(temp_dir.path(), "a/b");
        let page = build_page(&context, &settings(), &root);

        assert_eq!(page.path, "a/b");
        assert_eq!(page.entries[0].entry.name, "..");
        assert_eq!(page.entries[0].url, "/?b=a");
        assert_eq!(page.entries[0].modified, "-");
        assert_eq!(page.entries[1].url, "/?b=a%2Fb%2Fc");
        assert_eq!(page.entries[2].url, "/files/a/b/my%20notes.txt");
    }

    #[test]
    fn test_symlink_row() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("real.txt"), "real").unwrap();
        symlink(temp_dir.path().join("real.txt"), temp_dir.path().join("alias.txt")).unwrap();

        let (context, root) = browse(temp_dir.path(), "");
        let page = build_page(&context, &settings(), &root);

        let alias = page
            .entries
            .iter()
            .find(|e| e.entry.name == "alias.txt")
            .unwrap();
        assert_eq!(alias.size_human, "-");
        assert_eq!(alias.url, "/files/alias.txt");
        assert_eq!(page.total_size, 4);
    }

    #[test]
    fn test_symlinked_directory_is_browsable() {
        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("docs")).unwrap();
        symlink(temp_dir.path().join("docs"), temp_dir.path().join("docs_link")).unwrap();
        symlink(outside.path(), temp_dir.path().join("away")).unwrap();

        let (context, root) = browse(temp_dir.path(), "");
        let page = build_page(&context, &settings(), &root);
        let find = |name: &str| page.entries.iter().find(|e| e.entry.name == name).unwrap();

        let docs_link = find("docs_link");
        assert_eq!(docs_link.entry.kind, EntryKind::Symlink);
        assert_eq!(docs_link.url, "/?b=docs_link");
        assert_eq!(docs_link.size_human, "-");
        assert!(!docs_link.previewable);

        let away = find("away");
        assert_eq!(away.entry.kind, EntryKind::Symlink);
        assert_eq!(away.url, "/files/away");
    }

    #[test]
    fn test_readme_included() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "# Hello").unwrap();

        let (context, root) = browse(temp_dir.path(), "");
        let page = build_page(&context, &settings(), &root);
        assert_eq!(page.readme.as_deref(), Some("# Hello"));

        let mut hidden = settings();
        hidden.display_readmes = false;
        let page = build_page(&context, &hidden, &root);
        assert!(page.readme.is_none());
    }

    #[test]
    fn test_readme_outside_root_is_not_read() {
        let temp_dir = TempDir::new().unwrap();
        let other_dir = TempDir::new().unwrap();
        fs::write(other_dir.path().join("secret.md"), "secret").unwrap();
        symlink(
            other_dir.path().join("secret.md"),
            temp_dir.path().join("README.md"),
        )
        .unwrap();

        let (context, root) = browse(temp_dir.path(), "");
        let page = build_page(&context, &settings(), &root);
        assert!(page.readme.is_none());
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0, "%Y"), "-");
        assert_eq!(format_time(1_704_067_200, "%Y").len(), 4);
        assert_eq!(format_time(1_704_067_200, "%Q"), "-");
    }

    #[test]
    fn test_preview_types_are_normalized() {
        let mut config = Config::default();
        config.files.preview_types = vec![".JPG".to_string(), " md ".to_string()];

        let settings = PageSettings::from_config(&config);
        assert!(settings.preview_types.contains("jpg"));
        assert!(settings.preview_types.contains("md"));
    }
}
