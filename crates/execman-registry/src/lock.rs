//! Cross-process lock guarding registry read-modify-write cycles

use execman_core::{Error, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exclusive advisory lock on `<registry>.lock`
///
/// Held for the span of load → mutate → save. The lock is released when the
/// guard is dropped and the file handle closes.
#[derive(Debug)]
pub struct RegistryLock {
    _file: File,
    path: PathBuf,
}

impl RegistryLock {
    /// Block until the lock for `registry_path` is held
    pub fn acquire(registry_path: &Path) -> Result<Self> {
        let path = lock_path(registry_path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::registry_io(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| Error::registry_io(&path, e))?;

        file.lock_exclusive()
            .map_err(|e| Error::registry_io(&path, e))?;

        debug!("Acquired registry lock {:?}", path);
        Ok(Self { _file: file, path })
    }

}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        debug!("Released registry lock {:?}", self.path);
    }
}

fn lock_path(registry_path: &Path) -> PathBuf {
    let mut name = registry_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "registry.json".into());
    name.push(".lock");
    registry_path.with_file_name(name)
}
