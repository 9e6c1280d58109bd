//! Forge releases API client and release selection

use execman_core::{Error, Result, Settings};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::source::SourceSpec;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Page size requested when listing releases
const RELEASES_PER_PAGE: u32 = 100;

/// Release information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// Release tag (e.g., "v1.2.0")
    #[serde(rename = "tag_name")]
    pub tag: String,

    /// Release title
    #[serde(rename = "name", default, deserialize_with = "null_as_default")]
    pub title: String,

    /// Whether this is a prerelease
    #[serde(rename = "prerelease", default)]
    pub is_prerelease: bool,

    /// Whether this is an unpublished draft
    #[serde(default)]
    pub draft: bool,

    /// Release assets, in upstream order
    #[serde(default, deserialize_with = "null_as_default")]
    pub assets: Vec<ReleaseAsset>,
}

/// Release asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// Asset file name
    pub name: String,

    /// Download URL
    #[serde(rename = "browser_download_url")]
    pub download_url: String,

    /// Advertised size in bytes
    #[serde(rename = "size", default)]
    pub size_bytes: u64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// Pick the first release passing the prerelease policy
///
/// Releases are expected newest-first. Drafts never qualify.
pub fn select_release(
    releases: Vec<Release>,
    include_prereleases: bool,
    owner: &str,
    project: &str,
) -> Result<Release> {
    if releases.is_empty() {
        return Err(Error::not_found(format!(
            "no releases published for {}/{}",
            owner, project
        )));
    }

    releases
        .into_iter()
        .find(|r| !r.draft && (include_prereleases || !r.is_prerelease))
        .ok_or_else(|| Error::NoMatchingRelease {
            owner: owner.to_string(),
            project: project.to_string(),
        })
}

/// Client for the forge releases API
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl ReleaseClient {
    /// Create a client from settings (API URL, token, timeout, user agent)
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&settings.network.user_agent)
            .timeout(Duration::from_secs(settings.network.http_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: settings.github.api_url.trim_end_matches('/').to_string(),
            token: settings.github.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Resolve a source to exactly one release
    ///
    /// A pinned source fetches that tag directly; otherwise the release list is
    /// scanned for the newest release passing the prerelease policy.
    pub async fn resolve(&self, source: &SourceSpec, include_prereleases: bool) -> Result<Release> {
        match &source.version {
            Some(tag) => self.release_by_tag(&source.owner, &source.project, tag).await,
            None => {
                let releases = self.list_releases(&source.owner, &source.project).await?;
                select_release(
                    releases,
                    include_prereleases,
                    &source.owner,
                    &source.project,
                )
            }
        }
    }

    /// List releases, newest first
    pub async fn list_releases(&self, owner: &str, project: &str) -> Result<Vec<Release>> {
        let url = format!(
            "{}/repos/{}/{}/releases?per_page={}",
            self.api_url, owner, project, RELEASES_PER_PAGE
        );
        let releases: Vec<Release> = self
            .get_json(&url, &format!("releases of {}/{}", owner, project))
            .await?;
        debug!("Found {} releases for {}/{}", releases.len(), owner, project);
        Ok(releases)
    }

    /// Fetch a single release by tag
    pub async fn release_by_tag(&self, owner: &str, project: &str, tag: &str) -> Result<Release> {
        let url = format!(
            "{}/repos/{}/{}/releases/tags/{}",
            self.api_url, owner, project, tag
        );
        self.get_json(&url, &format!("release {} of {}/{}", tag, owner, project))
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        debug!("Fetching {}", url);

        let mut request = self.client.get(url).header(ACCEPT, GITHUB_ACCEPT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        match status {
            StatusCode::NOT_FOUND => return Err(Error::not_found(what)),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                return Err(Error::RateLimited {
                    what: what.to_string(),
                })
            }
            StatusCode::UNAUTHORIZED => {
                return Err(Error::Unauthorized {
                    what: what.to_string(),
                })
            }
            s if !s.is_success() => {
                return Err(Error::Api {
                    url: url.to_string(),
                    status: s.as_u16(),
                })
            }
            _ => {}
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::malformed(url, e.to_string()))
    }
}
