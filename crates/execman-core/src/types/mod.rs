//! Type definitions shared across execman crates

mod digest;
mod settings;

pub use digest::{Sha256Digest, SHA256_PREFIX};
pub use settings::{GitHubConfig, NetworkConfig, Settings};
