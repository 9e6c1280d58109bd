//! # execman-core
//!
//! Core library for execman providing:
//! - The error taxonomy shared by every pipeline stage
//! - Layered settings loading (defaults, settings file, environment)
//! - Host platform detection in forge naming
//! - The `sha256:` digest value type

pub mod config;
pub mod error;
pub mod platform;
pub mod types;
pub mod utils;

pub use config::SettingsLoader;
pub use error::{Error, Result};
pub use platform::Platform;
pub use types::{Settings, Sha256Digest};
pub use utils::get_home_dir;
