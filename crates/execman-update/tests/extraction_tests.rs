//! Archive extraction safety tests

mod common;

use common::*;
use execman_core::{Error, Platform};
use execman_registry::Registry;
use execman_update::{extract_executable, ArchiveKind, InstallRequest, Installer};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::MockServer;

fn hostile_archive(payload: &[u8]) -> Vec<u8> {
    tar_gz(&[
        TarEntry {
            name: "../../evil",
            mode: 0o755,
            data: payload,
        },
        TarEntry {
            name: "/tmp/absolute-evil",
            mode: 0o755,
            data: b"absolute",
        },
    ])
}

/// Every file under `root`, relative paths
fn files_under(root: &Path) -> Vec<String> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                found.push(
                    path.strip_prefix(root)
                        .unwrap()
                        .to_string_lossy()
                        .into_owned(),
                );
            }
        }
    }
    found.sort();
    found
}

#[test]
fn test_traversal_entry_is_confined_to_destination() {
    let temp = TempDir::new().unwrap();
    let sandbox = temp.path().join("a").join("b");
    fs::create_dir_all(&sandbox).unwrap();

    let archive = temp.path().join("tool_linux_amd64.tar.gz");
    fs::write(&archive, hostile_archive(b"payload")).unwrap();

    let dest = sandbox.join("bin").join("tool");
    extract_executable(&archive, ArchiveKind::TarGz, &dest)
        .unwrap()
        .persist()
        .unwrap();

    assert_eq!(fs::read(&dest).unwrap(), b"payload");
    assert!(!temp.path().join("evil").exists());
    assert!(!sandbox.join("evil").exists());
    assert_eq!(
        files_under(temp.path()),
        vec![
            format!("a{0}b{0}bin{0}tool", std::path::MAIN_SEPARATOR),
            "tool_linux_amd64.tar.gz".to_string(),
        ]
    );
}

#[test]
fn test_archive_without_executable_bit() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("tool_linux_amd64.tar.gz");
    fs::write(
        &archive,
        tar_gz(&[TarEntry {
            name: "tool",
            mode: 0o644,
            data: b"not executable",
        }]),
    )
    .unwrap();

    let dest = temp.path().join("bin").join("tool");
    let err = extract_executable(&archive, ArchiveKind::TarGz, &dest).unwrap_err();
    assert!(matches!(err, Error::NoExecutableInArchive { .. }));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_pipeline_with_hostile_archive_stays_in_install_dir() {
    let server = MockServer::start().await;
    let archive = hostile_archive(b"payload");
    let checksum = sha256_hex(&archive);
    let release = mock_release_assets(
        &server,
        TAG_V1_2_0,
        &[
            (LINUX_AMD64_ASSET, archive),
            (
                CHECKSUMS_ASSET,
                checksums_txt(&[(checksum.as_str(), LINUX_AMD64_ASSET)]).into_bytes(),
            ),
        ],
    )
    .await;
    mock_release_list(&server, OWNER, PROJECT, &[release]).await;

    let temp = TempDir::new().unwrap();
    let bin_dir = temp.path().join("x").join("y").join("bin");
    let mut registry = Registry::with_install_dir(temp.path().join("registry.json"), &bin_dir);

    let installer =
        Installer::for_platform(settings_for(&server), Platform::new("linux", "amd64")).unwrap();
    let outcome = installer
        .install(&mut registry, &InstallRequest::new("acme/tool"))
        .await
        .unwrap();

    assert_eq!(outcome.record.path, bin_dir.join(PROJECT));
    assert_eq!(fs::read(bin_dir.join(PROJECT)).unwrap(), b"payload");
    assert!(!temp.path().join("x").join("evil").exists());
    assert!(!temp.path().join("evil").exists());
}
