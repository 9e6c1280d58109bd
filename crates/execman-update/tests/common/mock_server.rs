//! Mock forge helpers
//!
//! One wiremock server plays both the releases API and the asset host.

use execman_core::Settings;
use execman_update::releases::Release;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::archives::*;
use super::builders::*;
use super::constants::*;

/// Settings pointing the release client at the mock server
pub fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.github.api_url = server.uri();
    settings.network.http_timeout_secs = 5;
    settings.network.download_timeout_secs = 5;
    settings
}

/// Serve `GET /repos/{owner}/{project}/releases`
pub async fn mock_release_list(
    server: &MockServer,
    owner: &str,
    project: &str,
    releases: &[Release],
) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/releases", owner, project)))
        .respond_with(ResponseTemplate::new(200).set_body_json(releases))
        .mount(server)
        .await;
}

/// Serve `GET /repos/{owner}/{project}/releases/tags/{tag}`
pub async fn mock_release_by_tag(
    server: &MockServer,
    owner: &str,
    project: &str,
    release: &Release,
) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/repos/{}/{}/releases/tags/{}",
            owner, project, release.tag
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(release))
        .mount(server)
        .await;
}

/// Answer any GET on `route` with a bare status
pub async fn mock_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Answer any GET on `route` with a raw body
pub async fn mock_body(server: &MockServer, route: &str, body: impl Into<Vec<u8>>) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.into()))
        .mount(server)
        .await;
}

/// Serve each `(name, body)` as an asset of `tag` and return the release
/// describing them, in the given order
pub async fn mock_release_assets(
    server: &MockServer,
    tag: &str,
    assets: &[(&str, Vec<u8>)],
) -> Release {
    let mut builder = ReleaseBuilder::new().tag(tag);
    for (name, body) in assets {
        mock_body(server, &asset_path(tag, name), body.clone()).await;
        builder = builder.asset(
            ReleaseAssetBuilder::new(name)
                .served_from(&server.uri(), tag)
                .size(body.len() as u64)
                .build(),
        );
    }
    builder.build()
}

/// Standard release: linux and darwin archives plus a correct `checksums.txt`
pub async fn mock_standard_release(
    server: &MockServer,
    tag: &str,
    linux_binary: &[u8],
) -> Release {
    let linux = tool_archive(linux_binary);
    let darwin = tool_archive(b"darwin build");
    let linux_sum = sha256_hex(&linux);
    let darwin_sum = sha256_hex(&darwin);
    let checksums = checksums_txt(&[
        (linux_sum.as_str(), LINUX_AMD64_ASSET),
        (darwin_sum.as_str(), DARWIN_ARM64_ASSET),
    ]);

    mock_release_assets(
        server,
        tag,
        &[
            (LINUX_AMD64_ASSET, linux),
            (DARWIN_ARM64_ASSET, darwin),
            (CHECKSUMS_ASSET, checksums.into_bytes()),
        ],
    )
    .await
}
