//! SHA-256 verification against published checksum manifests
//!
//! A manifest is a text file of `<hex>  <file>` lines (`<hex> *<file>` in
//! binary mode). The last field of a line is the file name; names may be
//! path-qualified and are compared by base name. A per-asset `.sha256` file
//! may hold just the digest. When no manifest or no entry exists,
//! verification is skipped with a warning unless checksums are required.

use execman_core::{Error, Result, Sha256Digest};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::download::DownloadedAsset;
use crate::releases::ReleaseAsset;

/// Read buffer for hashing (1MB)
const HASH_CHUNK_SIZE: usize = 1024 * 1024;

/// Compute the `sha256:<hex>` digest of a file
pub fn compute_file_digest(path: &Path) -> Result<Sha256Digest> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Sha256Digest::from_hex(&hex::encode(hasher.finalize()))
}

/// Locate the checksum manifest among a release's assets
///
/// Preference: `checksums.txt`, `*checksums.txt`, `SHA256SUMS` /
/// `sha256sums.txt`, then a per-asset `<asset>.sha256`.
pub fn find_manifest_asset<'a>(
    assets: &'a [ReleaseAsset],
    target: &str,
) -> Option<&'a ReleaseAsset> {
    let by = |pred: &dyn Fn(&str) -> bool| {
        assets
            .iter()
            .find(|a| a.name != target && pred(a.name.to_ascii_lowercase().as_str()))
    };

    by(&|n| n == "checksums.txt")
        .or_else(|| by(&|n| n.ends_with("checksums.txt")))
        .or_else(|| by(&|n| n == "sha256sums" || n == "sha256sums.txt"))
        .or_else(|| {
            let per_asset = format!("{}.sha256", target.to_ascii_lowercase());
            by(&|n| n == per_asset)
        })
}

/// Parsed checksum manifest
#[derive(Debug, Clone, Default)]
pub struct ChecksumManifest {
    entries: HashMap<String, Sha256Digest>,
    /// A digest with no file name, only kept for per-asset manifests
    bare: Option<Sha256Digest>,
}

impl ChecksumManifest {
    /// Parse a multi-asset manifest; malformed and name-less lines are ignored
    pub fn parse(text: &str) -> Self {
        Self::parse_lines(text, false)
    }

    /// Parse a per-asset manifest (`<asset>.sha256`), where a lone digest
    /// applies to the asset it sits beside
    pub fn parse_single(text: &str) -> Self {
        Self::parse_lines(text, true)
    }

    fn parse_lines(text: &str, accept_bare: bool) -> Self {
        let mut manifest = Self::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let Some(hex) = parts.next() else { continue };
            let Ok(digest) = Sha256Digest::from_hex(hex) else {
                debug!("Ignoring manifest line: {}", line);
                continue;
            };

            match parts.last() {
                Some(name) => {
                    let name = name.trim_start_matches('*');
                    manifest.entries.insert(base_name(name).to_string(), digest);
                }
                None if accept_bare => {
                    manifest.bare.get_or_insert(digest);
                }
                None => debug!("Ignoring digest without file name: {}", line),
            }
        }

        manifest
    }

    /// Expected digest for an asset, compared by base name
    pub fn lookup(&self, asset_name: &str) -> Option<&Sha256Digest> {
        self.entries
            .get(base_name(asset_name))
            .or(self.bare.as_ref())
    }

    /// Number of named entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no usable entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.bare.is_none()
    }
}

fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Outcome of a verification that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Digest matched the manifest entry
    Verified(Sha256Digest),
    /// No manifest entry existed; the digest was computed but not checked
    Skipped { digest: Sha256Digest, reason: String },
}

impl Verification {
    /// Computed digest of the asset
    pub fn digest(&self) -> &Sha256Digest {
        match self {
            Self::Verified(digest) | Self::Skipped { digest, .. } => digest,
        }
    }

    /// Whether the digest was checked against a manifest
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }
}

/// Checks downloaded assets against manifest entries
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumVerifier {
    require: bool,
}

impl ChecksumVerifier {
    /// `require` turns a missing manifest or entry into an error
    pub fn new(require: bool) -> Self {
        Self { require }
    }

    /// Verify a downloaded asset
    pub fn verify(
        &self,
        asset: &DownloadedAsset,
        manifest: Option<&ChecksumManifest>,
    ) -> Result<Verification> {
        let actual = compute_file_digest(&asset.path)?;
        self.check(&asset.name, actual, manifest)
    }

    /// Compare an already computed digest against the manifest
    pub fn check(
        &self,
        asset_name: &str,
        actual: Sha256Digest,
        manifest: Option<&ChecksumManifest>,
    ) -> Result<Verification> {
        let expected = match manifest {
            Some(manifest) => manifest.lookup(asset_name),
            None => None,
        };

        match expected {
            Some(expected) if *expected == actual => {
                debug!("Checksum verified for {}: {}", asset_name, actual);
                Ok(Verification::Verified(actual))
            }
            Some(expected) => Err(Error::ChecksumMismatch {
                asset: asset_name.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            }),
            None if self.require => Err(Error::ChecksumUnavailable {
                asset: asset_name.to_string(),
            }),
            None => {
                let reason = if manifest.is_some() {
                    "no entry in checksum manifest"
                } else {
                    "no checksum manifest published"
                };
                warn!(
                    "Checksum verification skipped for {}: {} (integrity not verified)",
                    asset_name, reason
                );
                Ok(Verification::Skipped {
                    digest: actual,
                    reason: reason.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // sha256("hello world")
    const HELLO_HEX: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
    const OTHER_HEX: &str = "0000000000000000000000000000000000000000000000000000000000000000";

    fn release_asset(name: &str) -> ReleaseAsset {
        ReleaseAsset {
            name: name.to_string(),
            download_url: format!("https://example.com/{}", name),
            size_bytes: 0,
        }
    }

    #[test]
    fn test_compute_file_digest() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        let digest = compute_file_digest(file.path()).unwrap();
        assert_eq!(digest.as_str(), format!("sha256:{}", HELLO_HEX));
    }

    #[test]
    fn test_manifest_parsing() {
        let text = format!(
            "# generated\n\n{HELLO_HEX}  dist/tool_linux_amd64.tar.gz\n{OTHER_HEX} *tool_darwin_arm64.tar.gz\nnot-a-digest tool.zip\n"
        );
        let manifest = ChecksumManifest::parse(&text);
        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest.lookup("tool_linux_amd64.tar.gz").unwrap().hex(),
            HELLO_HEX
        );
        assert_eq!(
            manifest.lookup("tool_darwin_arm64.tar.gz").unwrap().hex(),
            OTHER_HEX
        );
        assert!(manifest.lookup("tool.zip").is_none());
    }

    #[test]
    fn test_bare_digest_file() {
        let manifest = ChecksumManifest::parse_single(&format!("{}\n", HELLO_HEX.to_uppercase()));
        assert_eq!(manifest.lookup("anything").unwrap().hex(), HELLO_HEX);
    }

    #[test]
    fn test_bare_digest_ignored_in_multi_asset_manifest() {
        let text = format!("{OTHER_HEX}\n{HELLO_HEX}  tool_linux_amd64.tar.gz\n");
        let manifest = ChecksumManifest::parse(&text);
        assert_eq!(manifest.len(), 1);
        assert!(manifest.lookup("tool_darwin_arm64.tar.gz").is_none());
        assert_eq!(
            manifest.lookup("tool_linux_amd64.tar.gz").unwrap().hex(),
            HELLO_HEX
        );
    }

    #[test]
    fn test_file_name_is_last_field() {
        let text = format!("{HELLO_HEX}  1234  build/tool_linux_amd64.tar.gz\n");
        let manifest = ChecksumManifest::parse(&text);
        assert_eq!(
            manifest.lookup("tool_linux_amd64.tar.gz").unwrap().hex(),
            HELLO_HEX
        );
        assert!(manifest.lookup("1234").is_none());
    }

    #[test]
    fn test_find_manifest_preference() {
        let assets = vec![
            release_asset("tool_linux_amd64.tar.gz"),
            release_asset("tool_linux_amd64.tar.gz.sha256"),
            release_asset("tool_1.2.0_checksums.txt"),
        ];
        assert_eq!(
            find_manifest_asset(&assets, "tool_linux_amd64.tar.gz")
                .unwrap()
                .name,
            "tool_1.2.0_checksums.txt"
        );

        let assets = vec![
            release_asset("tool_linux_amd64.tar.gz"),
            release_asset("tool_linux_amd64.tar.gz.sha256"),
        ];
        assert_eq!(
            find_manifest_asset(&assets, "tool_linux_amd64.tar.gz")
                .unwrap()
                .name,
            "tool_linux_amd64.tar.gz.sha256"
        );

        let assets = vec![release_asset("tool_linux_amd64.tar.gz"), release_asset("SHA256SUMS")];
        assert!(find_manifest_asset(&assets, "tool_linux_amd64.tar.gz").is_some());

        let assets = vec![release_asset("tool_linux_amd64.tar.gz")];
        assert!(find_manifest_asset(&assets, "tool_linux_amd64.tar.gz").is_none());
    }

    #[test]
    fn test_check_outcomes() {
        let actual = Sha256Digest::from_hex(HELLO_HEX).unwrap();
        let matching = ChecksumManifest::parse(&format!("{HELLO_HEX}  tool.tar.gz"));
        let wrong = ChecksumManifest::parse(&format!("{OTHER_HEX}  tool.tar.gz"));
        let unrelated = ChecksumManifest::parse(&format!("{HELLO_HEX}  other.tar.gz"));

        let lenient = ChecksumVerifier::new(false);
        assert!(lenient
            .check("tool.tar.gz", actual.clone(), Some(&matching))
            .unwrap()
            .is_verified());
        assert!(matches!(
            lenient.check("tool.tar.gz", actual.clone(), Some(&wrong)),
            Err(Error::ChecksumMismatch { .. })
        ));
        let skipped = lenient
            .check("tool.tar.gz", actual.clone(), Some(&unrelated))
            .unwrap();
        assert!(!skipped.is_verified());
        assert_eq!(skipped.digest(), &actual);
        assert!(!lenient
            .check("tool.tar.gz", actual.clone(), None)
            .unwrap()
            .is_verified());

        let strict = ChecksumVerifier::new(true);
        assert!(matches!(
            strict.check("tool.tar.gz", actual.clone(), None),
            Err(Error::ChecksumUnavailable { .. })
        ));
        assert!(matches!(
            strict.check("tool.tar.gz", actual, Some(&unrelated)),
            Err(Error::ChecksumUnavailable { .. })
        ));
    }
}
