//! Per-name install pipeline and batch check/update
//!
//! Stages run strictly in order:
//! `Resolving → Selecting → Matching → Downloading → Verifying → Extracting → Registering`.
//! A failure at any stage stops the run and is reported with the stage it
//! happened in. `Registering` is the only stage that touches the registry
//! file or the installed executable: the extracted payload stays staged
//! beside its destination until the registry is saved, so a failed run leaves
//! both as they were.

use chrono::Utc;
use execman_core::{Error, Platform, Result, Settings};
use execman_registry::{ExecutableRecord, Registry};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::archive::{extract_executable, ArchiveKind, StagedExecutable};
use crate::assets::AssetMatcher;
use crate::checksum::{find_manifest_asset, ChecksumManifest, ChecksumVerifier, Verification};
use crate::download::Downloader;
use crate::releases::{Release, ReleaseAsset, ReleaseClient};
use crate::source::SourceSpec;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idle,
    Resolving,
    Selecting,
    Matching,
    Downloading,
    Verifying,
    Extracting,
    Registering,
    Done,
}

impl Stage {
    /// Lowercase stage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Selecting => "selecting",
            Self::Matching => "matching",
            Self::Downloading => "downloading",
            Self::Verifying => "verifying",
            Self::Extracting => "extracting",
            Self::Registering => "registering",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pipeline run that stopped at `stage`
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    /// Stage that failed
    pub stage: Stage,
    /// Underlying error
    #[source]
    pub error: Error,
}

impl PipelineFailure {
    pub fn new(stage: Stage, error: Error) -> Self {
        Self { stage, error }
    }
}

type StageResult<T> = std::result::Result<T, PipelineFailure>;

trait AtStage<T> {
    fn at(self, stage: Stage) -> StageResult<T>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: Stage) -> StageResult<T> {
        self.map_err(|error| PipelineFailure::new(stage, error))
    }
}

/// What to install and where
#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    /// Source identifier, optionally pinned with `@tag`
    pub source: String,
    /// Local name; defaults to the project name
    pub name: Option<String>,
    /// Install directory; defaults to settings, then the registry default
    pub install_dir: Option<PathBuf>,
    /// Override the configured prerelease policy
    pub include_prereleases: Option<bool>,
}

impl InstallRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = Some(dir.into());
        self
    }

    pub fn with_prereleases(mut self, include: bool) -> Self {
        self.include_prereleases = Some(include);
        self
    }
}

/// Result of a successful install
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// Local name
    pub name: String,
    /// Record written to the registry
    pub record: ExecutableRecord,
    /// Version replaced by this install, if any
    pub previous_version: Option<String>,
    /// Whether the asset digest was checked against a manifest
    pub checksum_verified: bool,
}

/// Status of one managed executable against its latest release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub name: String,
    pub source: String,
    pub current_version: String,
    pub latest_version: String,
    pub update_available: bool,
}

/// A per-name failure in a batch operation
#[derive(Debug)]
pub struct BatchFailure {
    pub name: String,
    pub failure: PipelineFailure,
}

/// Outcome of a batch check
#[derive(Debug, Default)]
pub struct CheckSummary {
    /// Reports sorted by name
    pub reports: Vec<CheckReport>,
    /// Names that could not be checked
    pub failures: Vec<BatchFailure>,
}

impl CheckSummary {
    /// Number of names with a newer release
    pub fn updates_available(&self) -> usize {
        self.reports.iter().filter(|r| r.update_available).count()
    }
}

/// Outcome for one name in a batch update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub name: String,
    pub from_version: String,
    pub to_version: String,
    /// False when the name was already current and not forced
    pub updated: bool,
}

/// Outcome of a batch update
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Outcomes sorted by name
    pub outcomes: Vec<UpdateOutcome>,
    /// Names whose update failed; their records are unchanged
    pub failures: Vec<BatchFailure>,
}

impl UpdateReport {
    /// Number of names actually reinstalled
    pub fn updated_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.updated).count()
    }
}

/// Executable payload fetched, verified and staged, not yet registered
struct Acquired {
    record: ExecutableRecord,
    verification: Verification,
    staged: StagedExecutable,
}

/// Runs the acquisition pipeline against one forge
#[derive(Debug, Clone)]
pub struct Installer {
    settings: Settings,
    platform: Platform,
    releases: ReleaseClient,
    downloader: Downloader,
    matcher: AssetMatcher,
    verifier: ChecksumVerifier,
}

impl Installer {
    /// Installer for the host platform
    pub fn new(settings: Settings) -> Result<Self> {
        Self::for_platform(settings, Platform::detect())
    }

    /// Installer targeting an explicit platform
    pub fn for_platform(settings: Settings, platform: Platform) -> Result<Self> {
        Ok(Self {
            releases: ReleaseClient::new(&settings)?,
            downloader: Downloader::new(&settings)?,
            matcher: AssetMatcher::new(&platform)?,
            verifier: ChecksumVerifier::new(settings.require_checksum),
            settings,
            platform,
        })
    }

    /// Show download progress bars
    pub fn with_progress(mut self, show: bool) -> Self {
        self.downloader = self.downloader.with_progress(show);
        self
    }

    /// Where `name` is installed: `<dir>/<name>[.exe]`
    ///
    /// Directory precedence: explicit `dir`, settings `install-dir`, then the
    /// registry's default.
    pub fn install_path(&self, registry: &Registry, name: &str, dir: Option<&Path>) -> PathBuf {
        let dir = dir
            .or(self.settings.install_dir.as_deref())
            .unwrap_or(&registry.default_install_dir);
        dir.join(format!("{}{}", name, self.platform.exe_suffix()))
    }

    /// Install (or reinstall) one executable and save the registry
    pub async fn install(
        &self,
        registry: &mut Registry,
        request: &InstallRequest,
    ) -> StageResult<InstallOutcome> {
        debug!("{}: {}", request.source, Stage::Resolving);
        let spec = SourceSpec::parse(&request.source).at(Stage::Resolving)?;

        let name = match request.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => spec.project.clone(),
        };
        validate_local_name(&name).at(Stage::Resolving)?;

        let include = request
            .include_prereleases
            .unwrap_or(self.settings.include_prereleases);
        let release = self.select(&spec, include).await?;

        let dest = self.install_path(registry, &name, request.install_dir.as_deref());
        let acquired = self.acquire(&spec, &release, &dest).await?;

        debug!("{}: {}", name, Stage::Registering);
        let Acquired {
            record,
            verification,
            staged,
        } = acquired;
        let previous = registry.upsert(name.clone(), record.clone());
        if let Err(error) = registry.save() {
            restore(registry, &name, previous);
            return Err(PipelineFailure::new(Stage::Registering, error));
        }
        if let Err(error) = staged.persist() {
            restore(registry, &name, previous);
            if let Err(e) = registry.save() {
                warn!("Could not roll back registry entry for {}: {}", name, e);
            }
            return Err(PipelineFailure::new(Stage::Registering, error));
        }

        info!(
            "Installed {} {} to {}",
            name,
            record.version,
            record.path.display()
        );
        debug!("{}: {}", name, Stage::Done);

        Ok(InstallOutcome {
            name,
            previous_version: previous.map(|r| r.version),
            checksum_verified: verification.is_verified(),
            record,
        })
    }

    /// Compare managed names against their latest releases
    ///
    /// An empty `names` checks everything. Never modifies the registry.
    pub async fn check(
        &self,
        registry: &Registry,
        names: &[String],
        include_prereleases: bool,
    ) -> CheckSummary {
        let (targets, failures) = resolve_targets(registry, names);
        let mut summary = CheckSummary {
            reports: Vec::new(),
            failures,
        };

        let results = self
            .bounded(targets, move |name, record| async move {
                self.check_one(name, record, include_prereleases)
                    .await
                    .map(|(report, _)| report)
            })
            .await;

        for (name, result) in results {
            match result {
                Ok(report) => summary.reports.push(report),
                Err(failure) => summary.failures.push(BatchFailure { name, failure }),
            }
        }

        summary
    }

    /// Reinstall names whose latest release differs (all of them with `force`)
    ///
    /// Names are processed concurrently; successful records are merged and the
    /// registry is saved once. Staged executables replace the installed ones
    /// only after that save succeeds. Per-name failures are collected, not
    /// fatal.
    pub async fn update(
        &self,
        registry: &mut Registry,
        names: &[String],
        force: bool,
        include_prereleases: bool,
    ) -> StageResult<UpdateReport> {
        let (targets, failures) = resolve_targets(registry, names);
        let mut report = UpdateReport {
            outcomes: Vec::new(),
            failures,
        };

        let results = self
            .bounded(targets, move |name, record| async move {
                self.update_one(name, record, force, include_prereleases)
                    .await
            })
            .await;

        let mut acquired = Vec::new();
        for (name, result) in results {
            match result {
                Ok((outcome, staged)) => {
                    if let Some(staged) = staged {
                        acquired.push((name, staged));
                    }
                    report.outcomes.push(outcome);
                }
                Err(failure) => report.failures.push(BatchFailure { name, failure }),
            }
        }

        if acquired.is_empty() {
            return Ok(report);
        }

        debug!("Registering {} updated executables", acquired.len());
        let mut pending = Vec::with_capacity(acquired.len());
        for (name, acquired) in acquired {
            let previous = registry.upsert(name.clone(), acquired.record);
            pending.push((name, previous, acquired.staged));
        }
        if let Err(error) = registry.save() {
            for (name, previous, _) in pending {
                restore(registry, &name, previous);
            }
            return Err(PipelineFailure::new(Stage::Registering, error));
        }

        let mut rolled_back = false;
        for (name, previous, staged) in pending {
            match staged.persist() {
                Ok(path) => info!("Updated {} at {}", name, path.display()),
                Err(error) => {
                    restore(registry, &name, previous);
                    report.outcomes.retain(|o| o.name != name);
                    report.failures.push(BatchFailure {
                        name,
                        failure: PipelineFailure::new(Stage::Registering, error),
                    });
                    rolled_back = true;
                }
            }
        }
        if rolled_back {
            report.failures.sort_by(|a, b| a.name.cmp(&b.name));
            registry.save().at(Stage::Registering)?;
        }

        Ok(report)
    }

    async fn check_one(
        &self,
        name: String,
        record: ExecutableRecord,
        include_prereleases: bool,
    ) -> StageResult<(CheckReport, Release)> {
        let spec = SourceSpec::parse(&record.source)
            .at(Stage::Resolving)?
            .with_version(None);
        let release = self.select(&spec, include_prereleases).await?;

        let report = CheckReport {
            update_available: release.tag != record.version,
            latest_version: release.tag.clone(),
            current_version: record.version,
            source: spec.unpinned(),
            name,
        };
        Ok((report, release))
    }

    async fn update_one(
        &self,
        name: String,
        record: ExecutableRecord,
        force: bool,
        include_prereleases: bool,
    ) -> StageResult<(UpdateOutcome, Option<Acquired>)> {
        let dest = record.path.clone();
        let (report, release) = self
            .check_one(name.clone(), record, include_prereleases)
            .await?;

        let mut outcome = UpdateOutcome {
            name,
            from_version: report.current_version,
            to_version: report.latest_version,
            updated: false,
        };

        if !report.update_available && !force {
            debug!("{} is up to date at {}", outcome.name, outcome.from_version);
            return Ok((outcome, None));
        }

        let spec = SourceSpec::parse(&report.source).at(Stage::Resolving)?;
        let acquired = self.acquire(&spec, &release, &dest).await?;
        info!(
            "Staged {} {} -> {}",
            outcome.name, outcome.from_version, outcome.to_version
        );
        outcome.updated = true;
        Ok((outcome, Some(acquired)))
    }

    async fn select(&self, spec: &SourceSpec, include_prereleases: bool) -> StageResult<Release> {
        debug!("{}: {}", spec, Stage::Selecting);
        let release = self
            .releases
            .resolve(spec, include_prereleases)
            .await
            .at(Stage::Selecting)?;
        debug!("Selected release {} of {}", release.tag, spec.unpinned());
        Ok(release)
    }

    /// Matching through Extracting; the result is staged for `dest`, not yet installed
    async fn acquire(
        &self,
        spec: &SourceSpec,
        release: &Release,
        dest: &Path,
    ) -> StageResult<Acquired> {
        debug!("{}: {}", spec, Stage::Matching);
        let asset = self.matcher.select(release).at(Stage::Matching)?.clone();
        debug!("Matched asset {} for {}", asset.name, self.platform);

        debug!("{}: {}", spec, Stage::Downloading);
        let work_dir = TempDir::new().map_err(Error::from).at(Stage::Downloading)?;
        let downloaded = self
            .downloader
            .download(&asset, work_dir.path())
            .await
            .at(Stage::Downloading)?;

        debug!("{}: {}", spec, Stage::Verifying);
        let manifest = self
            .fetch_manifest(release, &asset)
            .await
            .at(Stage::Verifying)?;
        let verification = self
            .verifier
            .verify(&downloaded, manifest.as_ref())
            .at(Stage::Verifying)?;

        debug!("{}: {}", spec, Stage::Extracting);
        let kind = ArchiveKind::from_name(&asset.name);
        let archive_path = downloaded.path.clone();
        let target = dest.to_path_buf();
        let asset_name = asset.name.clone();
        let staged =
            tokio::task::spawn_blocking(move || extract_executable(&archive_path, kind, &target))
                .await
                .map_err(|e| Error::archive(asset_name, e.to_string()))
                .and_then(|r| r)
                .at(Stage::Extracting)?;

        Ok(Acquired {
            record: ExecutableRecord {
                source: spec.unpinned(),
                version: release.tag.clone(),
                installed_at: Utc::now(),
                path: dest.to_path_buf(),
                platform: self.platform.to_string(),
                checksum: Some(verification.digest().clone()),
            },
            verification,
            staged,
        })
    }

    async fn fetch_manifest(
        &self,
        release: &Release,
        asset: &ReleaseAsset,
    ) -> Result<Option<ChecksumManifest>> {
        let Some(manifest_asset) = find_manifest_asset(&release.assets, &asset.name) else {
            return Ok(None);
        };
        debug!("Using checksum manifest {}", manifest_asset.name);
        let text = self
            .downloader
            .fetch_text(&manifest_asset.download_url)
            .await?;
        let manifest = if manifest_asset.name.to_ascii_lowercase().ends_with(".sha256") {
            ChecksumManifest::parse_single(&text)
        } else {
            ChecksumManifest::parse(&text)
        };
        Ok(Some(manifest))
    }

    /// Run `op` for each target, at most `max-parallel` at a time; results sorted by name
    async fn bounded<T, F, Fut>(
        &self,
        targets: Vec<(String, ExecutableRecord)>,
        op: F,
    ) -> Vec<(String, StageResult<T>)>
    where
        F: Fn(String, ExecutableRecord) -> Fut,
        Fut: Future<Output = StageResult<T>>,
    {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_parallel.max(1)));
        let mut futures = FuturesUnordered::new();

        for (name, record) in targets {
            let sem = semaphore.clone();
            let work = op(name.clone(), record);
            futures.push(async move {
                let _permit = sem.acquire().await.ok();
                (name, work.await)
            });
        }

        let mut results = Vec::new();
        while let Some(result) = futures.next().await {
            results.push(result);
        }
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }
}

/// Split requested names into managed records and not-managed failures
fn resolve_targets(
    registry: &Registry,
    names: &[String],
) -> (Vec<(String, ExecutableRecord)>, Vec<BatchFailure>) {
    let mut wanted: Vec<String> = if names.is_empty() {
        registry.list()
    } else {
        names.to_vec()
    };
    wanted.sort();
    wanted.dedup();

    let mut targets = Vec::new();
    let mut failures = Vec::new();
    for name in wanted {
        match registry.get(&name) {
            Some(record) => targets.push((name, record.clone())),
            None => failures.push(BatchFailure {
                failure: PipelineFailure::new(
                    Stage::Idle,
                    Error::not_found(format!("executable '{}' is not managed by execman", name)),
                ),
                name,
            }),
        }
    }
    (targets, failures)
}

/// Put back the record `name` had before an upsert
fn restore(registry: &mut Registry, name: &str, previous: Option<ExecutableRecord>) {
    match previous {
        Some(previous) => {
            registry.upsert(name.to_string(), previous);
        }
        None => {
            registry.remove(name);
        }
    }
}

/// A local name becomes a file name inside the install directory
fn validate_local_name(name: &str) -> Result<()> {
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::invalid_source(
            name,
            "local name must be a plain file name",
        ));
    }
    Ok(())
}
