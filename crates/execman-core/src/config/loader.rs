//! Layered settings loader
//!
//! Loads settings from multiple sources with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. Settings file (<config_dir>/execman/config.yaml)
//! 3. Environment variables (EXECMAN_* prefix, plus GITHUB_TOKEN)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::Settings;
use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Settings file name inside the config directory
pub const SETTINGS_FILE_NAME: &str = "config.yaml";

/// Settings loader
pub struct SettingsLoader {
    /// Directory holding the settings file
    config_dir: Utf8PathBuf,
}

impl SettingsLoader {
    /// Create a loader rooted at the standard config directory
    pub fn new() -> Result<Self> {
        let config_dir = Self::default_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the standard config directory (e.g. ~/.config/execman)
    pub fn default_config_dir() -> Result<Utf8PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| Error::invalid_config("Could not determine config directory"))?;
        let dir = Utf8PathBuf::from_path_buf(base.join("execman"))
            .map_err(|p| Error::invalid_config(format!("Non UTF-8 config path: {}", p.display())))?;
        Ok(dir)
    }

    /// Path of the settings file this loader reads
    pub fn settings_path(&self) -> Utf8PathBuf {
        self.config_dir.join(SETTINGS_FILE_NAME)
    }

    /// Load settings with layered precedence; a missing file is not an error
    pub fn load(&self) -> Result<Settings> {
        let path = self.settings_path();
        let settings = if path.exists() {
            self.load_yaml_file(&path)?
        } else {
            debug!("No settings file at {}, using defaults", path);
            Settings::default()
        };

        Self::apply_env_overrides(settings)
    }

    /// Load settings from an explicit file, which must exist
    pub fn load_file(path: &Utf8Path) -> Result<Settings> {
        if !path.exists() {
            return Err(Error::invalid_config(format!(
                "Settings file not found: {}",
                path
            )));
        }
        let loader = Self::with_dir(path.parent().map(Utf8Path::to_path_buf).unwrap_or_default());
        let settings = loader.load_yaml_file(path)?;
        Self::apply_env_overrides(settings)
    }

    /// Load a YAML file and parse it
    fn load_yaml_file(&self, path: &Utf8Path) -> Result<Settings> {
        debug!("Loading settings from {}", path);
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }
        let settings: Settings = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    fn apply_env_overrides(mut settings: Settings) -> Result<Settings> {
        if let Ok(val) = env::var("EXECMAN_INSTALL_DIR") {
            if !val.is_empty() {
                settings.install_dir = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = env::var("EXECMAN_INCLUDE_PRERELEASES") {
            settings.include_prereleases = parse_bool("EXECMAN_INCLUDE_PRERELEASES", &val)?;
        }

        if let Ok(val) = env::var("EXECMAN_REQUIRE_CHECKSUM") {
            settings.require_checksum = parse_bool("EXECMAN_REQUIRE_CHECKSUM", &val)?;
        }

        if let Ok(val) = env::var("EXECMAN_MAX_PARALLEL") {
            settings.max_parallel = val.parse().map_err(|_| {
                Error::invalid_config("EXECMAN_MAX_PARALLEL must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("EXECMAN_GITHUB_API_URL") {
            settings.github.api_url = val.trim_end_matches('/').to_string();
        }

        if let Ok(val) = env::var("GITHUB_TOKEN") {
            if !val.is_empty() {
                settings.github.token = Some(val);
            }
        }

        if let Ok(val) = env::var("EXECMAN_HTTP_TIMEOUT_SECS") {
            settings.network.http_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("EXECMAN_HTTP_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("EXECMAN_DOWNLOAD_TIMEOUT_SECS") {
            settings.network.download_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("EXECMAN_DOWNLOAD_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if settings.max_parallel == 0 {
            settings.max_parallel = 1;
        }

        Ok(settings)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::invalid_config(format!(
            "{} must be a boolean, got '{}'",
            name, value
        ))),
    }
}
