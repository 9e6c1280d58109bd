//! Installed-executable record

use chrono::{DateTime, Utc};
use execman_core::Sha256Digest;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// One managed executable, keyed by its local name in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutableRecord {
    /// Canonical source identifier (e.g. "github.com/acme/tool")
    pub source: String,

    /// Tag of the release actually installed
    pub version: String,

    /// When the install completed
    pub installed_at: DateTime<Utc>,

    /// Where the executable lives
    pub path: PathBuf,

    /// Platform the asset was built for ("linux/amd64")
    pub platform: String,

    /// Digest of the downloaded asset, absent when never computed
    #[serde(
        default,
        deserialize_with = "deserialize_optional_digest",
        skip_serializing_if = "Option::is_none"
    )]
    pub checksum: Option<Sha256Digest>,
}

/// An empty string is treated the same as a missing checksum
fn deserialize_optional_digest<'de, D>(deserializer: D) -> Result<Option<Sha256Digest>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Sha256Digest::parse(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
