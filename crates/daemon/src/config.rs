//! Configuration management for the dirbrowse daemon.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/dirbrowse/config.toml`.

use std::collections::HashSet;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use dirbrowse_protocol::{SortKey, SortOrder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::files::ListingFilter;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("root directory does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("root path is not a directory: {0}")]
    RootNotADirectory(PathBuf),

    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),

    #[error("date_format is not a valid strftime format: {0}")]
    InvalidDateFormat(String),

    #[error("archive_dir is not a directory: {0}")]
    InvalidArchiveDir(PathBuf),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Prefix shared by all environment overrides.
const ENV_PREFIX: &str = "DIRBROWSE_";

/// Main configuration structure for the dirbrowse daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP service configuration.
    pub server: ServerConfig,

    /// What is browsed and how entries are filtered.
    pub files: FilesConfig,

    /// Listing order and presentation settings.
    pub listing: ListingConfig,
}

/// HTTP service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: SocketAddr,

    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

/// Browsed tree configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilesConfig {
    /// Root directory. Nothing outside it is ever listed or served.
    pub root: PathBuf,

    /// Skip entries whose name starts with a dot.
    pub hide_dot_files: bool,

    /// Exact entry names that are never listed.
    pub ignore: Vec<String>,

    /// Offer zip-on-demand downloads.
    pub zip_downloads: bool,

    /// Include the directory's README.md in the page.
    pub display_readmes: bool,

    /// Extensions that can be previewed inline.
    pub preview_types: Vec<String>,

    /// Directory for temporary archives (system temp dir when unset).
    pub archive_dir: Option<PathBuf>,
}

/// Listing order and presentation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListingConfig {
    /// Default sort key. Unknown values fall back to `name`.
    pub sort: SortKey,

    /// Reverse the default order.
    pub reverse: bool,

    /// strftime format for modification times.
    pub date_format: String,

    /// Title reported in every page.
    pub site_title: String,

    /// Page language.
    pub language: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: "info".to_string(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            hide_dot_files: false,
            ignore: Vec::new(),
            zip_downloads: true,
            display_readmes: true,
            preview_types: default_preview_types(),
            archive_dir: None,
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            sort: SortKey::Name,
            reverse: false,
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
            site_title: "Directory Listing".to_string(),
            language: "en".to_string(),
        }
    }
}

fn default_preview_types() -> Vec<String> {
    [
        "jpg", "jpeg", "png", "gif", "svg", "webp", "txt", "md", "pdf", "mp4", "webm", "mp3",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dirbrowse")
        .join("config.toml")
}

/// Parse a boolean flag the way the environment and query strings spell it.
///
/// `1`, `true`, `on` and `yes` (any case) are true; everything else is false.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// Split a comma separated list, dropping empty items.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a non-empty override from the environment.
fn env_override(name: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{name}"))
        .ok()
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Empty variables are ignored. Supported variables:
    /// - DIRBROWSE_ROOT, DIRBROWSE_BIND, DIRBROWSE_LOG_LEVEL
    /// - DIRBROWSE_HIDE_DOT_FILES, DIRBROWSE_IGNORE_FILES (comma separated)
    /// - DIRBROWSE_ZIP_DOWNLOADS, DIRBROWSE_DISPLAY_READMES, DIRBROWSE_PREVIEW_TYPES
    /// - DIRBROWSE_SORT_ORDER, DIRBROWSE_REVERSE_SORT
    /// - DIRBROWSE_SITE_TITLE, DIRBROWSE_DATE_FORMAT
    pub fn apply_env_overrides(&mut self) {
        if let Some(root) = env_override("ROOT") {
            tracing::info!("Overriding root from environment: {}", root);
            self.files.root = PathBuf::from(root);
        }

        if let Some(bind) = env_override("BIND") {
            match bind.parse() {
                Ok(addr) => {
                    tracing::info!("Overriding bind address from environment: {}", addr);
                    self.server.bind = addr;
                }
                Err(e) => tracing::warn!("Ignoring invalid {}BIND {:?}: {}", ENV_PREFIX, bind, e),
            }
        }

        if let Some(level) = env_override("LOG_LEVEL") {
            tracing::info!("Overriding log_level from environment: {}", level);
            self.server.log_level = level;
        }

        if let Some(value) = env_override("HIDE_DOT_FILES") {
            self.files.hide_dot_files = parse_flag(&value);
        }

        if let Some(value) = env_override("IGNORE_FILES") {
            self.files.ignore = parse_list(&value);
        }

        if let Some(value) = env_override("ZIP_DOWNLOADS") {
            self.files.zip_downloads = parse_flag(&value);
        }

        if let Some(value) = env_override("DISPLAY_READMES") {
            self.files.display_readmes = parse_flag(&value);
        }

        if let Some(value) = env_override("PREVIEW_TYPES") {
            self.files.preview_types = parse_list(&value);
        }

        if let Some(value) = env_override("SORT_ORDER") {
            self.listing.sort = SortKey::lenient(&value);
        }

        if let Some(value) = env_override("REVERSE_SORT") {
            self.listing.reverse = parse_flag(&value);
        }

        if let Some(value) = env_override("SITE_TITLE") {
            self.listing.site_title = value;
        }

        if let Some(value) = env_override("DATE_FORMAT") {
            self.listing.date_format = value;
        }
    }

    /// The log level in effect once environment overrides apply.
    ///
    /// Lets logging start before [`Config::apply_env_overrides`] runs, so
    /// the overrides themselves are logged.
    pub fn effective_log_level(&self) -> String {
        env_override("LOG_LEVEL").unwrap_or_else(|| self.server.log_level.clone())
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let root = &self.files.root;
        if !root.exists() {
            return Err(ConfigError::RootNotFound(root.clone()));
        }
        if !root.is_dir() {
            return Err(ConfigError::RootNotADirectory(root.clone()));
        }

        if let Some(dir) = &self.files.archive_dir {
            if !dir.is_dir() {
                return Err(ConfigError::InvalidArchiveDir(dir.clone()));
            }
        }

        let level = self.server.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.server.log_level.clone()));
        }

        let format = &self.listing.date_format;
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidDateFormat(format.clone()));
        }

        Ok(())
    }

    /// The default order applied when a request does not ask for one.
    pub fn sort_order(&self) -> SortOrder {
        SortOrder::new(self.listing.sort, self.listing.reverse)
    }

    /// Entry filter derived from the files section.
    pub fn listing_filter(&self) -> ListingFilter {
        ListingFilter {
            hide_dot_files: self.files.hide_dot_files,
            ignore_names: self.files.ignore.iter().cloned().collect::<HashSet<_>>(),
        }
    }

    /// Directory temporary archives are written to.
    pub fn archive_dir(&self) -> PathBuf {
        self.files
            .archive_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    /// If the file exists but is invalid TOML, returns an error with
    /// a helpful message.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}
