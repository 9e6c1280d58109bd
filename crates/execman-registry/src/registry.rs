//! Registry of managed executables
//!
//! The registry is loaded wholesale, mutated in memory and saved wholesale.
//! Only [`Registry::save`] touches durable storage, so a failed install that
//! never reaches `upsert` + `save` leaves the persisted state untouched.

use execman_core::utils::default_install_dir;
use execman_core::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::record::ExecutableRecord;

/// Schema version written by this build
pub const SCHEMA_VERSION: u32 = 1;

/// Registry file name inside the config directory
pub const REGISTRY_FILE_NAME: &str = "registry.json";

/// Persistent mapping from local executable name to its install record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    /// Schema version of the persisted document
    pub schema_version: u32,

    /// Install directory used when settings don't name one
    pub default_install_dir: PathBuf,

    #[serde(default, deserialize_with = "null_as_empty")]
    executables: BTreeMap<String, ExecutableRecord>,

    #[serde(skip)]
    path: PathBuf,
}

fn null_as_empty<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, ExecutableRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

impl Registry {
    /// Default registry file path (e.g. ~/.config/execman/registry.json)
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::invalid_config("Could not determine config directory"))?;
        Ok(config_dir.join("execman").join(REGISTRY_FILE_NAME))
    }

    /// Load the registry from a specific path
    ///
    /// A registry that has never been written is returned empty rather than
    /// treated as an error.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No registry at {:?}, starting empty", path);
                return Self::empty(path);
            }
            Err(e) => return Err(Error::registry_io(&path, e)),
        };

        let mut registry: Registry = serde_json::from_str(&data)
            .map_err(|e| Error::registry_format(&path, e.to_string()))?;

        if registry.schema_version > SCHEMA_VERSION {
            return Err(Error::registry_format(
                &path,
                format!(
                    "schema version {} is newer than supported version {}",
                    registry.schema_version, SCHEMA_VERSION
                ),
            ));
        }

        registry.path = path;
        debug!(
            "Loaded registry with {} executables from {:?}",
            registry.executables.len(),
            registry.path
        );
        Ok(registry)
    }

    /// Create an empty registry bound to `path` with the default install directory
    pub fn empty(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::with_install_dir(path, default_install_dir()?))
    }

    /// Create an empty registry with an explicit default install directory
    pub fn with_install_dir(path: impl Into<PathBuf>, install_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            default_install_dir: install_dir.into(),
            executables: BTreeMap::new(),
            path: path.into(),
        }
    }

    /// Path the registry is saved to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a record by local name
    pub fn get(&self, name: &str) -> Option<&ExecutableRecord> {
        self.executables.get(name)
    }

    /// Insert or replace the record for `name`, returning the previous one
    pub fn upsert(
        &mut self,
        name: impl Into<String>,
        record: ExecutableRecord,
    ) -> Option<ExecutableRecord> {
        self.executables.insert(name.into(), record)
    }

    /// Remove the record for `name`; absent names are not an error
    pub fn remove(&mut self, name: &str) -> Option<ExecutableRecord> {
        self.executables.remove(name)
    }

    /// All managed names (callers needing an order should sort)
    pub fn list(&self) -> Vec<String> {
        self.executables.keys().cloned().collect()
    }

    /// Iterate over all records
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExecutableRecord)> {
        self.executables.iter()
    }

    /// Number of managed executables
    pub fn len(&self) -> usize {
        self.executables.len()
    }

    /// Whether no executables are managed
    pub fn is_empty(&self) -> bool {
        self.executables.is_empty()
    }

    /// Serialize the whole registry and atomically replace the persisted file
    ///
    /// The document is written to a temp file in the same directory with
    /// owner-only permissions, synced, then renamed over the target.
    pub fn save(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        create_private_dir(parent).map_err(|e| Error::registry_io(parent, e))?;

        let mut data = serde_json::to_string_pretty(self)
            .map_err(|e| Error::registry_format(&self.path, e.to_string()))?;
        data.push('\n');

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| Error::registry_io(parent, e))?;
        set_owner_only(temp.as_file()).map_err(|e| Error::registry_io(temp.path(), e))?;
        temp.write_all(data.as_bytes())
            .map_err(|e| Error::registry_io(temp.path(), e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| Error::registry_io(temp.path(), e))?;

        temp.persist(&self.path)
            .map_err(|e| Error::registry_io(&self.path, e.error))?;

        debug!(
            "Saved registry with {} executables to {:?}",
            self.executables.len(),
            self.path
        );
        Ok(())
    }
}

/// Create a directory (and parents) with owner-only access if missing
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    if dir.exists() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().mode(0o700).recursive(true).create(dir)
    }

    #[cfg(not(unix))]
    {
        fs::create_dir_all(dir)
    }
}

fn set_owner_only(file: &fs::File) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
    }

    #[cfg(not(unix))]
    {
        let _ = file;
        Ok(())
    }
}
