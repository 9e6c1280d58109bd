//! CLI command implementations

pub mod check;
pub mod install;
pub mod list;
pub mod remove;
pub mod update;
pub mod version;
