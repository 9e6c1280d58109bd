//! Release acquisition pipeline for execman
//!
//! Provides:
//! - Source identifier parsing (`host/owner/project@version`)
//! - Release listing and selection against a forge releases API
//! - Platform asset matching via a compiled alias rule table
//! - Streaming asset download with progress tracking
//! - SHA-256 verification against published checksum manifests
//! - Traversal-safe executable extraction from tar.gz and zip archives,
//!   staged until the registry records the install
//! - The per-name install pipeline and batch check/update

pub mod archive;
pub mod assets;
pub mod checksum;
pub mod download;
pub mod installer;
pub mod releases;
pub mod source;

pub use archive::{extract_executable, ArchiveKind, StagedExecutable};
pub use assets::AssetMatcher;
pub use checksum::{
    compute_file_digest, find_manifest_asset, ChecksumManifest, ChecksumVerifier, Verification,
};
pub use download::{DownloadedAsset, Downloader};
pub use installer::{
    BatchFailure, CheckReport, CheckSummary, InstallOutcome, InstallRequest, Installer,
    PipelineFailure, Stage, UpdateOutcome, UpdateReport,
};
pub use releases::{Release, ReleaseAsset, ReleaseClient};
pub use source::SourceSpec;

/// Current execman version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
