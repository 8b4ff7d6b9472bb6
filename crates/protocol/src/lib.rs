//! # dirbrowse Protocol Library
//!
//! This crate provides the data model shared between the dirbrowse daemon
//! and whatever renders its listings.
//!
//! ## Overview
//!
//! - **Entries**: one filesystem item within a listing, classified as file,
//!   directory or symlink
//! - **Listings**: an ordered sequence of entries with aggregate counters
//! - **Sort orders**: the sort key plus direction applied to a listing
//! - **Pages**: the JSON document returned for a browse request
//!
//! ## Example Usage
//!
//! ```rust
//! use dirbrowse_protocol::{Entry, EntryKind, Listing, SortKey};
//!
//! let mut listing = Listing::default();
//! listing.push(Entry::new("notes.TXT", EntryKind::File, 12, 1704067200));
//!
//! assert_eq!(listing.total, 1);
//! assert_eq!(listing.total_size, 12);
//! assert_eq!(listing.entries[0].extension, "txt");
//! assert_eq!(SortKey::lenient("bogus"), SortKey::Name);
//! ```
//!
//! ## Modules
//!
//! - [`entry`]: entries and listings
//! - [`order`]: sort keys and directions
//! - [`page`]: page documents, human-readable sizes and URL helpers
//! - [`error`]: error types

pub mod entry;
pub mod error;
pub mod order;
pub mod page;

pub use entry::{extension_of, Entry, EntryKind, Listing, PARENT_ENTRY_NAME};
pub use error::ProtocolError;
pub use order::{SortKey, SortOrder};
pub use page::{
    browse_url, file_url, human_size, parent_of, BrowsePage, PageEntry, FILES_ROUTE,
};
