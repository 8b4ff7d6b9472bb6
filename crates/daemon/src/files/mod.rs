//! Directory listing and navigation engine.
//!
//! This module provides:
//! - Browse path resolution sandboxed to the configured root
//! - Directory enumeration with dotfile and ignore-list filtering
//! - Listing order by name, size, time or type
//! - Single-file zip archives built on demand
//!
//! # Security
//!
//! Browse paths and file requests are canonicalized and must stay inside
//! the canonical root. Requests that do not are answered as if the root had
//! been requested. Listings never follow symlinks.

pub mod archive;
pub mod browser;
pub mod resolver;
pub mod sort;

pub use archive::{Archive, ArchiveExporter, ExportError};
pub use browser::{enumerate, BrowseContext, DirectoryBrowser, ListingFilter};
pub use resolver::{PathResolver, ResolveError, ResolvedPath};
