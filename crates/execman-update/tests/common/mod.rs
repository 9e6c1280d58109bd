//! Common test infrastructure for execman-update tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `constants`: Owner/project names, tags, platforms, payloads
//! - `builders`: Fluent builders for Release and ReleaseAsset
//! - `archives`: tar.gz fixtures, including hostile entry names
//! - `mock_server`: Wiremock setup for a fake forge API and asset host

// Not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod archives;
pub mod builders;
pub mod constants;
pub mod mock_server;

pub use archives::*;
pub use builders::*;
pub use constants::*;
pub use mock_server::*;
