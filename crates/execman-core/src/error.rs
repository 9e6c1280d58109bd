//! Error types for execman-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using execman-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised anywhere in the acquisition pipeline or registry
#[derive(Error, Debug)]
pub enum Error {
    /// Source identifier could not be parsed into owner/project
    #[error("Invalid source '{source_id}': {reason}")]
    InvalidSource { source_id: String, reason: String },

    /// Repository, tag or release does not exist (HTTP 404)
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Access forbidden or API rate limit exceeded (HTTP 403)
    #[error("Access forbidden or rate limited while fetching {what}")]
    RateLimited { what: String },

    /// Authentication required (HTTP 401)
    #[error("Authentication required while fetching {what}")]
    Unauthorized { what: String },

    /// Response body was not the expected shape
    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    /// Any other non-success API status
    #[error("Forge API returned status {status} for {url}")]
    Api { url: String, status: u16 },

    /// Release list was non-empty but nothing passed the prerelease filter
    #[error("No suitable release found for {owner}/{project} (prereleases excluded)")]
    NoMatchingRelease { owner: String, project: String },

    /// No release asset matched the target platform
    #[error("No asset matching {platform} in release {tag} (assets: {available})")]
    AssetNotFound {
        tag: String,
        platform: String,
        available: String,
    },

    /// Asset transfer failed
    #[error("Download of {url} failed: {message}")]
    DownloadFailed {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// Transport-level HTTP failure (connect, TLS, timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Digest of the downloaded asset differs from the manifest entry
    #[error("Checksum mismatch for {asset}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        asset: String,
        expected: String,
        actual: String,
    },

    /// Strict checksum mode is on but no manifest entry exists for the asset
    #[error("No checksum available for {asset} and checksum verification is required")]
    ChecksumUnavailable { asset: String },

    /// A digest string was not of the form `sha256:<64 lowercase hex>`
    #[error("Invalid digest '{value}'")]
    InvalidDigest { value: String },

    /// Archive contained no regular file with an executable bit
    #[error("No executable file found in archive {archive}")]
    NoExecutableInArchive { archive: String },

    /// Archive could not be read
    #[error("Failed to read archive {archive}: {message}")]
    Archive { archive: String, message: String },

    /// Registry file could not be read or written
    #[error("Registry I/O error at {}: {source}", path.display())]
    RegistryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registry file content is invalid or from a newer schema
    #[error("Invalid registry at {}: {message}", path.display())]
    RegistryFormat { path: PathBuf, message: String },

    /// Invalid settings file or environment override
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid source error
    pub fn invalid_source(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSource {
            source_id: source_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a malformed response error
    pub fn malformed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a download failure carrying the HTTP status
    pub fn download_status(url: impl Into<String>, status: u16) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            status: Some(status),
            message: format!("HTTP status {}", status),
        }
    }

    /// Create a download failure without a status (stream or write failure)
    pub fn download_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Create an archive read error
    pub fn archive(archive: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Archive {
            archive: archive.into(),
            message: message.into(),
        }
    }

    /// Create a registry I/O error
    pub fn registry_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::RegistryIo {
            path: path.into(),
            source,
        }
    }

    /// Create a registry format error
    pub fn registry_format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::RegistryFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Check whether the failure is transient and a caller-side retry may help.
    ///
    /// Nothing in execman retries on its own.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::DownloadFailed { status, .. } => status.map(|s| s >= 500).unwrap_or(true),
            _ => false,
        }
    }
}
