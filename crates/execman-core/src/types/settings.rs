//! User settings
//!
//! These types hold the user preferences execman consumes: where to
//! install, which releases to consider, and how to talk to the forge.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Install directory; the registry default applies when unset
    #[serde(default)]
    pub install_dir: Option<PathBuf>,

    /// Consider prereleases when selecting the latest release
    #[serde(default)]
    pub include_prereleases: bool,

    /// Fail instead of skipping verification when no checksum is published
    #[serde(default)]
    pub require_checksum: bool,

    /// Worker count for batch check/update
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Forge API settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            install_dir: None,
            include_prereleases: false,
            require_checksum: false,
            max_parallel: default_max_parallel(),
            github: GitHubConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

fn default_max_parallel() -> usize {
    4
}

/// Forge API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// Base URL for the releases API
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Bearer token sent with API requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            token: None,
        }
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// API request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Asset download timeout in seconds
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            download_timeout_secs: default_download_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout() -> u64 {
    30
}
fn default_download_timeout() -> u64 {
    300 // 5 minutes
}
fn default_user_agent() -> String {
    format!(
        "execman/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
