//! Image-Ripper: a site-scoped image crawler
//!
//! This crate crawls the pages of a single host, extracts image references
//! according to configurable selector rules, and downloads those images into
//! a local folder tree while deduplicating work and retrying transient
//! failures.

pub mod config;
pub mod crawler;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Image-Ripper operations
#[derive(Debug, Error)]
pub enum RipperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// Every distinct validation failure has its own variant and a stable
/// diagnostic number so that a one-line crash message pinpoints the field.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("[1] Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("[2] Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("[3] Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("[4] Invalid root URL '{url}': {reason}")]
    InvalidRoot { url: String, reason: String },

    #[error("[5] Invalid proxy server '{0}'")]
    InvalidProxy(String),

    #[error("[6] Invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("[7] Invalid value for header '{0}'")]
    InvalidHeaderValue(String),

    #[error("[8] Unknown charset '{0}'")]
    UnknownCharset(String),

    #[error("[9] Invalid {group} pattern '{pattern}': {source}")]
    InvalidPattern {
        group: &'static str,
        pattern: String,
        source: regex::Error,
    },

    #[error("[10] Invalid folder pattern '{pattern}': {source}")]
    InvalidFolderPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("[11] Invalid {group} selector '{selector}'")]
    InvalidSelector {
        group: &'static str,
        selector: String,
    },

    #[error("[12] Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Empty link")]
    Empty,

    #[error("Failed to resolve '{href}': {source}")]
    Resolve {
        href: String,
        source: ::url::ParseError,
    },

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Dedup ledger transition errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Unknown ledger key: {0}")]
    Unknown(String),

    #[error("Invalid state transition for {key}: {from:?} -> {to:?}")]
    InvalidTransition {
        key: String,
        from: state::EntryState,
        to: state::EntryState,
    },
}

/// HTML query errors
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),
}

/// Network-side failures of a page or image request; these are retried
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

/// Failures while saving an image
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for Image-Ripper operations
pub type Result<T> = std::result::Result<T, RipperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{EntryState, Ledger, LedgerSnapshot};
pub use crate::url::{matches_any, resolve_href, same_host};
