//! HTTP front end.
//!
//! Routes:
//! - `GET /?b=<path>&sort=<key>&reverse=<flag>`: listing page as JSON
//! - `POST /?b=<path>` with form field `zip_file`: single-file zip export
//! - `GET /files/<path>[?download]`: raw file contents

pub mod handlers;
pub mod page;

use std::future::Future;
use std::io;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use dirbrowse_protocol::SortOrder;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::files::{ArchiveExporter, DirectoryBrowser, PathResolver, ResolveError};

pub use page::PageSettings;

/// Shared state behind every request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub browser: DirectoryBrowser,
    pub exporter: ArchiveExporter,
    pub settings: PageSettings,
    /// Order used when a request does not override it.
    pub default_order: SortOrder,
}

impl AppState {
    /// Build the state from a validated configuration.
    pub fn from_config(config: &Config) -> Result<Self, ResolveError> {
        let resolver = PathResolver::new(&config.files.root)?;
        tracing::info!("Serving files from {}", resolver.root().display());

        Ok(Self {
            browser: DirectoryBrowser::new(resolver, config.listing_filter()),
            exporter: ArchiveExporter::new(config.archive_dir()),
            settings: PageSettings::from_config(config),
            default_order: config.sort_order(),
        })
    }
}

/// The application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::browse).post(handlers::export))
        .route("/files/{*path}", get(handlers::file))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve requests on `listener` until `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listening on http://{}", addr);
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
