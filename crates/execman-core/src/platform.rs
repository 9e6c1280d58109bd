//! Platform detection utilities
//!
//! Release assets name their target with forge conventions (`linux`,
//! `darwin`, `windows`; `amd64`, `arm64`, `386`). This module maps the
//! compile target onto those names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Target operating system and CPU architecture, in forge naming
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// OS token, e.g. "linux"
    pub os: String,
    /// Architecture token, e.g. "amd64"
    pub arch: String,
}

impl Platform {
    /// Create an explicit platform; tokens are lowercased
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into().to_ascii_lowercase(),
            arch: arch.into().to_ascii_lowercase(),
        }
    }

    /// Detect the host platform from the compile target
    pub fn detect() -> Self {
        Self::new(
            os_download_name(std::env::consts::OS),
            arch_download_name(std::env::consts::ARCH),
        )
    }

    /// Executable file suffix on this platform
    pub fn exe_suffix(&self) -> &'static str {
        if self.os == "windows" {
            ".exe"
        } else {
            ""
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Get the OS name used in release asset names (e.g., "darwin", "linux")
pub fn os_download_name(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

/// Get the architecture name used in release asset names (e.g., "amd64", "arm64")
pub fn arch_download_name(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}
