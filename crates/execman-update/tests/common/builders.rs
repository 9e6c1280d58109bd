//! Builder patterns for test data construction

use execman_update::releases::{Release, ReleaseAsset};

use super::constants::*;

/// Builder for Release objects with sensible test defaults
#[derive(Debug, Clone)]
pub struct ReleaseBuilder {
    release: Release,
}

impl ReleaseBuilder {
    pub fn new() -> Self {
        Self {
            release: Release {
                tag: TAG_V1_2_0.to_string(),
                title: String::new(),
                is_prerelease: false,
                draft: false,
                assets: Vec::new(),
            },
        }
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.release.tag = tag.to_string();
        self.release.title = format!("Release {}", tag);
        self
    }

    pub fn prerelease(mut self) -> Self {
        self.release.is_prerelease = true;
        self
    }

    pub fn asset(mut self, asset: ReleaseAsset) -> Self {
        self.release.assets.push(asset);
        self
    }

    pub fn build(self) -> Release {
        self.release
    }
}

impl Default for ReleaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for ReleaseAsset objects
#[derive(Debug, Clone)]
pub struct ReleaseAssetBuilder {
    asset: ReleaseAsset,
}

impl ReleaseAssetBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            asset: ReleaseAsset {
                name: name.to_string(),
                download_url: format!("https://example.com/{}", name),
                size_bytes: 0,
            },
        }
    }

    /// Point the asset at `<base>/download/<tag>/<name>`
    pub fn served_from(mut self, base: &str, tag: &str) -> Self {
        self.asset.download_url = format!("{}{}", base, asset_path(tag, &self.asset.name));
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.asset.size_bytes = size;
        self
    }

    pub fn build(self) -> ReleaseAsset {
        self.asset
    }
}

/// URL path an asset is served under by the mock forge
pub fn asset_path(tag: &str, name: &str) -> String {
    format!("/download/{}/{}", tag, name)
}
