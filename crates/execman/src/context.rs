//! Settings, registry and installer wiring shared by commands

use anyhow::{Context as _, Result};
use camino::Utf8PathBuf;
use execman_core::{Settings, SettingsLoader};
use execman_registry::{Registry, RegistryLock};
use execman_update::Installer;
use std::path::PathBuf;
use tracing::debug;

/// Resolved global options
pub struct Context {
    pub settings: Settings,
    pub registry_path: PathBuf,
    pub quiet: bool,
}

impl Context {
    /// Load settings (explicit file or the standard location) and locate the registry
    pub fn load(
        config: Option<&Utf8PathBuf>,
        registry: Option<PathBuf>,
        quiet: bool,
    ) -> Result<Self> {
        let settings = match config {
            Some(path) => SettingsLoader::load_file(path)
                .with_context(|| format!("Failed to load settings from {}", path))?,
            None => SettingsLoader::new()
                .and_then(|loader| loader.load())
                .context("Failed to load settings")?,
        };

        let registry_path = match registry {
            Some(path) => path,
            None => Registry::default_path().context("Failed to locate registry")?,
        };
        debug!("Using registry {:?}", registry_path);

        Ok(Self {
            settings,
            registry_path,
            quiet,
        })
    }

    pub fn load_registry(&self) -> Result<Registry> {
        Registry::load_from(&self.registry_path).context("Failed to load registry")
    }

    /// Hold for the whole load → mutate → save cycle
    pub fn lock_registry(&self) -> Result<RegistryLock> {
        RegistryLock::acquire(&self.registry_path).context("Failed to lock registry")
    }

    pub fn installer(&self) -> Result<Installer> {
        Ok(Installer::new(self.settings.clone())
            .context("Failed to initialise installer")?
            .with_progress(!self.quiet))
    }
}
