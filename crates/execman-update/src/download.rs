//! Asset download with progress tracking
//!
//! Assets are streamed straight to disk in one pass; nothing is buffered
//! whole in memory and there is no resume or retry.

use execman_core::utils::human_readable_size;
use execman_core::{Error, Result, Settings};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::CONTENT_LENGTH;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::releases::ReleaseAsset;

/// Result of a download operation
#[derive(Debug, Clone)]
pub struct DownloadedAsset {
    /// Asset name as published
    pub name: String,

    /// Path to the downloaded file
    pub path: PathBuf,

    /// Bytes written
    pub size: u64,
}

/// Streaming asset downloader
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    show_progress: bool,
}

impl Downloader {
    /// Create a downloader using the configured download timeout and user agent
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&settings.network.user_agent)
            .timeout(Duration::from_secs(settings.network.download_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            show_progress: false,
        })
    }

    /// Enable or disable progress bars
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Download an asset into `dest_dir`, keeping only the base of its name
    pub async fn download(&self, asset: &ReleaseAsset, dest_dir: &Path) -> Result<DownloadedAsset> {
        let file_name = Path::new(&asset.name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "asset".into());
        let path = dest_dir.join(file_name);

        info!(
            "Downloading {} ({})",
            asset.name,
            human_readable_size(asset.size_bytes)
        );
        debug!("GET {} -> {:?}", asset.download_url, path);

        let url = asset.download_url.as_str();
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::download_status(url, status.as_u16()));
        }

        let total_size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(asset.size_bytes);

        let progress = self.show_progress.then(|| {
            let pb = ProgressBar::new(total_size);
            pb.set_style(
                ProgressStyle::with_template(
                    "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
            );
            pb.set_message(format!("Downloading {}", asset.name));
            pb
        });

        let mut file = File::create(&path).map_err(|e| {
            Error::download_failed(url, format!("cannot create {}: {}", path.display(), e))
        })?;

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::download_failed(url, e.to_string()))?;
            file.write_all(&chunk)
                .map_err(|e| Error::download_failed(url, e.to_string()))?;
            downloaded += chunk.len() as u64;

            if let Some(pb) = &progress {
                pb.set_position(downloaded);
            }
        }

        file.flush()
            .map_err(|e| Error::download_failed(url, e.to_string()))?;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        if asset.size_bytes > 0 && downloaded != asset.size_bytes {
            debug!(
                "{} advertised {} bytes but {} were received",
                asset.name, asset.size_bytes, downloaded
            );
        }

        Ok(DownloadedAsset {
            name: asset.name.clone(),
            path,
            size: downloaded,
        })
    }

    /// Fetch a small text document (e.g. a checksum manifest)
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::download_status(url, status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| Error::download_failed(url, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn asset(server: &MockServer, name: &str, size: u64) -> ReleaseAsset {
        ReleaseAsset {
            name: name.to_string(),
            download_url: format!("{}/download/{}", server.uri(), name),
            size_bytes: size,
        }
    }

    #[tokio::test]
    async fn test_download_streams_to_file() {
        let server = MockServer::start().await;
        let content = b"fake binary content for testing".to_vec();
        Mock::given(method("GET"))
            .and(path("/download/tool_linux_amd64"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let downloader = Downloader::new(&Settings::default()).unwrap();
        let result = downloader
            .download(
                &asset(&server, "tool_linux_amd64", content.len() as u64),
                temp_dir.path(),
            )
            .await
            .unwrap();

        assert_eq!(result.size, content.len() as u64);
        assert_eq!(std::fs::read(&result.path).unwrap(), content);
        assert!(result.path.starts_with(temp_dir.path()));
    }

    #[tokio::test]
    async fn test_download_failure_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let downloader = Downloader::new(&Settings::default()).unwrap();
        let err = downloader
            .download(&asset(&server, "tool_linux_amd64", 0), temp_dir.path())
            .await
            .unwrap_err();

        match err {
            Error::DownloadFailed { status, .. } => assert_eq!(status, Some(503)),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
