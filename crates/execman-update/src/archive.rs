//! Executable extraction from release archives
//!
//! The first regular file whose mode carries any executable bit is taken,
//! in archive order. Entry names are never used as output paths: the payload
//! is staged in a temp file beside the destination and marked `0755`. It only
//! replaces the destination when [`StagedExecutable::persist`] is called, so
//! nothing is written outside that directory and a caller can abandon the
//! install without touching an existing executable.

use execman_core::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

const EXEC_BITS: u32 = 0o111;
const FILE_TYPE_MASK: u32 = 0o170000;
const REGULAR_FILE: u32 = 0o100000;

/// How an asset packages its executable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// gzip-compressed tar (`.tar.gz`, `.tgz`)
    TarGz,
    /// zip (`.zip`)
    Zip,
    /// The asset is the executable itself
    Bare,
}

impl ArchiveKind {
    /// Infer the kind from an asset name
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Self::TarGz
        } else if lower.ends_with(".zip") {
            Self::Zip
        } else {
            Self::Bare
        }
    }
}

/// An extracted executable waiting beside its destination
///
/// Dropping it without calling [`persist`](Self::persist) removes the staged
/// file and leaves the destination as it was.
#[derive(Debug)]
pub struct StagedExecutable {
    file: NamedTempFile,
    dest: PathBuf,
    archive: String,
}

impl StagedExecutable {
    /// Final location the payload will be renamed onto
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Atomically replace the destination with the staged payload
    pub fn persist(self) -> Result<PathBuf> {
        let Self {
            file,
            dest,
            archive,
        } = self;
        file.persist(&dest).map_err(|e| {
            Error::archive(
                &archive,
                format!("cannot install to {}: {}", dest.display(), e.error),
            )
        })?;
        debug!("Installed {} from {}", dest.display(), archive);
        Ok(dest)
    }
}

/// Extract the executable payload of `archive`, staged for `dest`
///
/// On failure nothing is left in the destination directory.
pub fn extract_executable(
    archive: &Path,
    kind: ArchiveKind,
    dest: &Path,
) -> Result<StagedExecutable> {
    let archive_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive.display().to_string());

    let dest_dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dest_dir)?;

    let mut staged = NamedTempFile::new_in(dest_dir)?;

    let source = File::open(archive)?;
    let found = match kind {
        ArchiveKind::TarGz => copy_from_tar_gz(source, staged.as_file_mut(), &archive_name)?,
        ArchiveKind::Zip => copy_from_zip(source, staged.as_file_mut(), &archive_name)?,
        ArchiveKind::Bare => {
            let mut source = source;
            io::copy(&mut source, staged.as_file_mut())?;
            Some(archive_name.clone())
        }
    };

    let Some(entry) = found else {
        return Err(Error::NoExecutableInArchive {
            archive: archive_name,
        });
    };
    debug!("Staged {} from {} for {:?}", entry, archive_name, dest);

    staged.as_file_mut().flush()?;
    make_executable(staged.as_file())?;
    staged.as_file().sync_all()?;

    Ok(StagedExecutable {
        file: staged,
        dest: dest.to_path_buf(),
        archive: archive_name,
    })
}

/// Copy the first executable regular tar entry; returns its name if found
fn copy_from_tar_gz(source: File, out: &mut File, archive_name: &str) -> Result<Option<String>> {
    let mut tar = tar::Archive::new(GzDecoder::new(source));
    let read_err = |e: io::Error| Error::archive(archive_name, e.to_string());

    for entry in tar.entries().map_err(read_err)? {
        let mut entry = entry.map_err(read_err)?;
        let header = entry.header();

        if !header.entry_type().is_file() {
            continue;
        }
        let mode = header.mode().map_err(read_err)?;
        if mode & EXEC_BITS == 0 {
            continue;
        }

        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        io::copy(&mut entry, out).map_err(read_err)?;
        return Ok(Some(name));
    }

    Ok(None)
}

/// Copy the first executable regular zip entry; returns its name if found
fn copy_from_zip(source: File, out: &mut File, archive_name: &str) -> Result<Option<String>> {
    let zip_err = |e: zip::result::ZipError| Error::archive(archive_name, e.to_string());
    let mut zip = zip::ZipArchive::new(source).map_err(zip_err)?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(zip_err)?;
        if entry.is_dir() {
            continue;
        }

        let Some(mode) = entry.unix_mode() else {
            continue;
        };
        let file_type = mode & FILE_TYPE_MASK;
        if (file_type != 0 && file_type != REGULAR_FILE) || mode & EXEC_BITS == 0 {
            continue;
        }

        let name = entry.name().to_string();
        io::copy(&mut entry, out).map_err(|e| Error::archive(archive_name, e.to_string()))?;
        return Ok(Some(name));
    }

    Ok(None)
}

fn make_executable(file: &File) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o755))
    }

    #[cfg(not(unix))]
    {
        let _ = file;
        Ok(())
    }
}
