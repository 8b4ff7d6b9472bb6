//! HTTP request handlers.
//!
//! Browse and export requests never fail visibly: an invalid browse path
//! lists the root and a failed export falls through to the listing.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Path as AxumPath, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use dirbrowse_protocol::{SortKey, SortOrder};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use super::page;
use super::AppState;
use crate::config::parse_flag;
use crate::files::{ExportError, ResolveError};

/// Read buffer for streamed responses.
const STREAM_CAPACITY: usize = 1 << 18;

/// Query string of a browse request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseQuery {
    /// Requested browse path.
    #[serde(default)]
    pub b: String,
    /// Sort key override.
    pub sort: Option<String>,
    /// Direction override.
    pub reverse: Option<String>,
}

impl BrowseQuery {
    /// Apply the request's overrides to the configured order.
    pub fn order(&self, default: SortOrder) -> SortOrder {
        SortOrder {
            key: self
                .sort
                .as_deref()
                .map(SortKey::lenient)
                .unwrap_or(default.key),
            reverse: self
                .reverse
                .as_deref()
                .map(parse_flag)
                .unwrap_or(default.reverse),
        }
    }
}

/// Form body of an export request.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportForm {
    pub zip_file: String,
}

/// Query string of a file request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileQuery {
    /// Present (with any value) to force a download.
    pub download: Option<String>,
}

/// `GET /`: render the listing page.
pub async fn browse(
    State(state): State<Arc<AppState>>,
    query: Result<Query<BrowseQuery>, QueryRejection>,
) -> Response {
    render_page(state, browse_query(query)).await
}

/// `POST /`: export one file as a zip archive, else render the page.
pub async fn export(
    State(state): State<Arc<AppState>>,
    query: Result<Query<BrowseQuery>, QueryRejection>,
    form: Result<Form<ExportForm>, FormRejection>,
) -> Response {
    let query = browse_query(query);

    if !state.settings.zip_downloads {
        tracing::debug!("Zip downloads disabled, rendering page");
        return render_page(state, query).await;
    }

    match form {
        Ok(Form(form)) => match export_archive(&state, &query.b, &form.zip_file).await {
            Ok(response) => return response,
            Err(e) => tracing::warn!("Export of {:?} failed: {}", form.zip_file, e),
        },
        Err(e) => tracing::debug!("No export form in request: {}", e),
    }

    render_page(state, query).await
}

/// `GET /files/{*path}`: stream one file from inside the root.
pub async fn file(
    State(state): State<Arc<AppState>>,
    AxumPath(path): AxumPath<String>,
    query: Result<Query<FileQuery>, QueryRejection>,
) -> Response {
    let download = query
        .map(|Query(q)| q.download.is_some())
        .unwrap_or(false);

    let lookup_state = Arc::clone(&state);
    let lookup_path = path.clone();
    let target = tokio::task::spawn_blocking(move || locate_file(&lookup_state, &lookup_path)).await;

    let target = match target {
        Ok(Ok(target)) => target,
        Ok(Err(e)) => {
            tracing::debug!("Refusing file request {:?}: {}", path, e);
            return error_response(StatusCode::NOT_FOUND, "File not found.");
        }
        Err(e) => {
            tracing::error!("File lookup task failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not read file.");
        }
    };

    match open_file(&target, download).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Failed to open {}: {}", target.display(), e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not read file.")
        }
    }
}

fn browse_query(query: Result<Query<BrowseQuery>, QueryRejection>) -> BrowseQuery {
    match query {
        Ok(Query(query)) => query,
        Err(e) => {
            tracing::debug!("Ignoring malformed query: {}", e);
            BrowseQuery::default()
        }
    }
}

async fn render_page(state: Arc<AppState>, query: BrowseQuery) -> Response {
    let order = query.order(state.default_order);
    let result = tokio::task::spawn_blocking(move || {
        let context = state.browser.browse(&query.b, order);
        page::build_page(&context, &state.settings, state.browser.resolver().root())
    })
    .await;

    match result {
        Ok(page) => Json(page).into_response(),
        Err(e) => {
            tracing::error!("Listing task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not list directory.")
        }
    }
}

async fn export_archive(
    state: &Arc<AppState>,
    browse_path: &str,
    file_name: &str,
) -> Result<Response, ExportError> {
    let task_state = Arc::clone(state);
    let browse_path = browse_path.to_string();
    let file_name = file_name.to_string();

    let archive = tokio::task::spawn_blocking(move || {
        task_state
            .exporter
            .export(&task_state.browser, &browse_path, &file_name)
    })
    .await
    .map_err(|e| ExportError::Io(io::Error::other(e)))??;

    let file = tokio::fs::File::open(archive.path()).await?;
    let (name, len, guard) = archive.into_parts();
    tracing::info!("Sending archive {} ({} bytes)", name, len);

    // The guard travels with the body and removes the archive once the
    // stream is dropped, finished or not.
    let stream = ReaderStream::with_capacity(file, STREAM_CAPACITY).map(move |chunk| {
        let _guard = &guard;
        chunk
    });

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/zip"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition("attachment", &name),
    );

    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

/// Canonical path of a servable file, or why it is not servable.
fn locate_file(state: &AppState, relative: &str) -> Result<PathBuf, ResolveError> {
    let filter = state.browser.filter();
    if let Some(hidden) = relative
        .split('/')
        .filter(|s| !s.is_empty())
        .find(|segment| !filter.accepts(segment))
    {
        return Err(ResolveError::TraversalRejected(PathBuf::from(hidden)));
    }

    let target = state.browser.resolver().contain(relative)?;
    if !target.is_file() {
        return Err(ResolveError::NotFound(target));
    }
    Ok(target)
}

async fn open_file(target: &std::path::Path, download: bool) -> io::Result<Response> {
    let file = tokio::fs::File::open(target).await?;
    let len = file.metadata().await?.len();

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());
    let mime_type = mime_guess::from_path(target)
        .first_or_octet_stream()
        .to_string();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&mime_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(if download { "attachment" } else { "inline" }, &file_name),
    );

    let stream = ReaderStream::with_capacity(file, STREAM_CAPACITY);
    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

/// Build a `Content-Disposition` value.
///
/// Plain ASCII names are sent as-is. Other names get an ASCII fallback plus
/// an RFC 5987 `filename*` parameter.
pub fn content_disposition(disposition: &str, file_name: &str) -> HeaderValue {
    let plain = file_name
        .chars()
        .all(|c| c.is_ascii_graphic() || c == ' ')
        && !file_name.contains(['"', '\\']);

    let value = if plain {
        format!("{disposition}; filename=\"{file_name}\"")
    } else {
        let fallback: String = file_name
            .chars()
            .map(|c| {
                if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!(
            "{disposition}; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(file_name)
        )
    };

    HeaderValue::from_str(&value)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"download\""))
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_order_overrides() {
        let default = SortOrder::new(SortKey::Type, false);

        let query = BrowseQuery::default();
        assert_eq!(query.order(default), default);

        let query = BrowseQuery {
            sort: Some("SIZE".to_string()),
            reverse: Some("1".to_string()),
            ..Default::default()
        };
        assert_eq!(query.order(default), SortOrder::new(SortKey::Size, true));

        let query = BrowseQuery {
            sort: Some("bogus".to_string()),
            reverse: Some("no".to_string()),
            ..Default::default()
        };
        assert_eq!(query.order(SortOrder::new(SortKey::Time, true)).key, SortKey::Name);
        assert!(!query.order(SortOrder::new(SortKey::Time, true)).reverse);
    }

    #[test]
    fn test_content_disposition_ascii() {
        let value = content_disposition("attachment", "report.pdf.zip");
        assert_eq!(value, "attachment; filename=\"report.pdf.zip\"");

        let value = content_disposition("inline", "my notes.txt");
        assert_eq!(value, "inline; filename=\"my notes.txt\"");
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let value = content_disposition("attachment", "résumé.txt.zip");
        let text = value.to_str().unwrap();
        assert!(text.starts_with("attachment; filename=\"r_sum_.txt.zip\""));
        assert!(text.ends_with("filename*=UTF-8''r%C3%A9sum%C3%A9.txt.zip"));
    }

    #[test]
    fn test_content_disposition_quotes() {
        let value = content_disposition("attachment", "say \"hi\".zip");
        let text = value.to_str().unwrap();
        assert!(text.starts_with("attachment; filename=\"say _hi_.zip\""));
    }
}
