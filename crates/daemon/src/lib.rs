//! # dirbrowse Daemon Library
//!
//! Serves a browsable listing of one directory tree over HTTP.
//!
//! ## Overview
//!
//! - **Path sandboxing**: every browse path and file request is resolved
//!   inside the configured root, anything else falls back to the root
//! - **Listings**: direct children with size, time and kind, filtered and
//!   ordered by name, size, time or type
//! - **Zip export**: any listed file can be downloaded as a single-entry
//!   zip archive built on demand
//! - **File access**: raw file contents, inline or as an attachment
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   HTTP router (axum)                 │
//! ├──────────────────────────────────────────────────────┤
//! │   ┌──────────────┐  ┌────────────┐  ┌────────────┐   │
//! │   │  Directory   │  │  Archive   │  │    Page    │   │
//! │   │   Browser    │  │  Exporter  │  │  Builder   │   │
//! │   └──────┬───────┘  └────────────┘  └────────────┘   │
//! │          │                                           │
//! │   ┌──────┴───────┐  ┌────────────┐                   │
//! │   │ PathResolver │  │   Sorter   │                   │
//! │   └──────────────┘  └────────────┘                   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dirbrowse::{AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::load_default()?;
//!     config.apply_env_overrides();
//!     config.validate()?;
//!
//!     let state = Arc::new(AppState::from_config(&config)?);
//!     let listener = tokio::net::TcpListener::bind(config.server.bind).await?;
//!     dirbrowse::server::serve(listener, state, std::future::pending()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: TOML configuration with environment overrides
//! - [`files`]: path resolution, enumeration, ordering and archives
//! - [`server`]: HTTP routes, handlers and page assembly

pub mod config;
pub mod files;
pub mod server;

pub use config::{Config, ConfigError};
pub use files::{
    ArchiveExporter, BrowseContext, DirectoryBrowser, ExportError, ListingFilter, PathResolver,
    ResolveError,
};
pub use server::{router, AppState, PageSettings};
