//! Platform asset matching
//!
//! Asset names are matched against `<sep><os><sep><arch>[ext]` at the end of
//! the name, case-insensitively, where `<sep>` is `_` or `-` and each token
//! expands to its known aliases. The first asset in upstream order wins.

use execman_core::{Error, Platform, Result};
use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::releases::{Release, ReleaseAsset};

/// OS spellings seen in release asset names
const OS_ALIASES: &[&[&str]] = &[
    &["linux"],
    &["darwin", "macos", "osx"],
    &["windows", "win"],
    &["freebsd"],
];

/// Architecture spellings seen in release asset names
const ARCH_ALIASES: &[&[&str]] = &[
    &["amd64", "x86_64", "x64"],
    &["arm64", "aarch64"],
    &["386", "i386", "x86"],
    &["arm", "armv7"],
];

/// Optional trailing extensions
const EXTENSIONS: &[&str] = &[".tar.gz", ".tgz", ".zip", ".exe"];

/// Compiled matcher for one target platform
#[derive(Debug, Clone)]
pub struct AssetMatcher {
    platform: Platform,
    pattern: Regex,
}

impl AssetMatcher {
    /// Compile the matching rule for `platform`
    pub fn new(platform: &Platform) -> Result<Self> {
        let source = format!(
            r"[_-]({})[_-]({})({})?$",
            alternation(&platform.os, OS_ALIASES),
            alternation(&platform.arch, ARCH_ALIASES),
            EXTENSIONS
                .iter()
                .map(|ext| regex::escape(ext))
                .collect::<Vec<_>>()
                .join("|"),
        );

        let pattern = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::invalid_config(format!("asset pattern for {}: {}", platform, e)))?;

        debug!("Asset pattern for {}: {}", platform, source);
        Ok(Self {
            platform: platform.clone(),
            pattern,
        })
    }

    /// Whether an asset name fits the platform pattern
    pub fn is_match(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    /// First asset in list order whose name fits the pattern
    pub fn find<'a>(&self, assets: &'a [ReleaseAsset]) -> Option<&'a ReleaseAsset> {
        assets.iter().find(|asset| self.is_match(&asset.name))
    }

    /// Select the asset for this platform from a release
    pub fn select<'a>(&self, release: &'a Release) -> Result<&'a ReleaseAsset> {
        self.find(&release.assets).ok_or_else(|| Error::AssetNotFound {
            tag: release.tag.clone(),
            platform: self.platform.to_string(),
            available: available_names(&release.assets),
        })
    }
}

/// Regex alternation of every alias in the group containing `token`
fn alternation(token: &str, table: &[&[&str]]) -> String {
    let token = token.to_ascii_lowercase();
    match table.iter().find(|group| group.contains(&token.as_str())) {
        Some(group) => group
            .iter()
            .map(|alias| regex::escape(alias))
            .collect::<Vec<_>>()
            .join("|"),
        None => regex::escape(&token),
    }
}

fn available_names(assets: &[ReleaseAsset]) -> String {
    if assets.is_empty() {
        return "none".to_string();
    }
    assets
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
