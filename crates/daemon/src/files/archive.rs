//! Single-file zip archives created on demand.
//!
//! Each export writes a uniquely named temporary archive, so concurrent
//! exports of the same file never share a path. The archive is removed when
//! the returned [`Archive`] (or the guard taken from it) is dropped, whether
//! or not its bytes were ever fully sent.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::browser::DirectoryBrowser;
use super::resolver::ResolveError;

/// Errors that can occur while exporting an archive.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The requested name has no usable base name.
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    /// The requested name is hidden from listings.
    #[error("file is not listed: {0:?}")]
    Hidden(String),

    /// The requested file resolves outside the root.
    #[error("file is outside the root: {0}")]
    OutsideRoot(PathBuf),

    /// The requested file does not exist.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// The requested path is a directory, not a file.
    #[error("path is a directory: {0}")]
    IsDirectory(PathBuf),

    /// The zip writer failed.
    #[error("archive creation failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A finished archive waiting to be sent.
#[derive(Debug)]
pub struct Archive {
    /// Download name, `<file>.zip`.
    name: String,
    /// Exact archive size in bytes.
    len: u64,
    /// Temporary archive, deleted on drop.
    path: TempPath,
}

impl Archive {
    /// Download name of the archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the archive in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the archive is empty. Finished archives never are.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Location of the temporary archive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Split into name, size and the guard that deletes the file.
    pub fn into_parts(self) -> (String, u64, TempPath) {
        (self.name, self.len, self.path)
    }
}

/// Creates single-entry zip archives in a temporary directory.
#[derive(Debug, Clone)]
pub struct ArchiveExporter {
    /// Directory temporary archives are written to.
    temp_dir: PathBuf,
}

impl ArchiveExporter {
    /// Create an exporter writing to `temp_dir`.
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
        }
    }

    /// Directory temporary archives are written to.
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Archive `file_name` from the directory `browse_path` resolves to.
    ///
    /// Only the base name of `file_name` is used. Names the listing filter
    /// hides and files resolving outside the root are refused, so nothing
    /// is exported that could not also be listed. On any failure no
    /// archive is left behind.
    pub fn export(
        &self,
        browser: &DirectoryBrowser,
        browse_path: &str,
        file_name: &str,
    ) -> Result<Archive, ExportError> {
        let name = sanitize_file_name(file_name)?;
        if !browser.filter().accepts(&name) {
            return Err(ExportError::Hidden(name));
        }

        let resolved = browser.resolver().resolve(browse_path);
        let relative = if resolved.is_root() {
            name.clone()
        } else {
            format!("{}/{}", resolved.browse_path, name)
        };

        let target = browser
            .resolver()
            .contain(&relative)
            .map_err(|e| match e {
                ResolveError::TraversalRejected(path) => ExportError::OutsideRoot(path),
                ResolveError::NotFound(path) | ResolveError::NotADirectory(path) => {
                    ExportError::NotFound(path)
                }
                ResolveError::Io(e) => ExportError::Io(e),
            })?;

        self.archive(&name, &target)
    }

    /// Write `target` into a fresh single-entry archive named `name`.
    fn archive(&self, name: &str, target: &Path) -> Result<Archive, ExportError> {
        let metadata = fs::metadata(target).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ExportError::NotFound(target.to_path_buf())
            } else {
                ExportError::Io(e)
            }
        })?;

        if metadata.is_dir() {
            return Err(ExportError::IsDirectory(target.to_path_buf()));
        }

        let mut temp = tempfile::Builder::new()
            .prefix(".dirbrowse-")
            .suffix(".zip")
            .tempfile_in(&self.temp_dir)?;

        {
            let mut zip = ZipWriter::new(temp.as_file_mut());
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .large_file(metadata.len() >= u64::from(u32::MAX));

            zip.start_file(name, options)?;
            let mut source = File::open(target)?;
            io::copy(&mut source, &mut zip)?;
            zip.finish()?;
        }

        let len = temp.as_file().metadata()?.len();
        let path = temp.into_temp_path();

        tracing::debug!(
            "Created archive for {} at {} ({} bytes)",
            target.display(),
            path.display(),
            len
        );

        Ok(Archive {
            name: format!("{name}.zip"),
            len,
            path,
        })
    }
}

/// Reduce a requested name to its base name.
fn sanitize_file_name(file_name: &str) -> Result<String, ExportError> {
    let normalized = file_name.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| ExportError::InvalidName(file_name.to_string()))
}
