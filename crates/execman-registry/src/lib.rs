//! # execman-registry
//!
//! Persistent record of every executable execman manages, keyed by local
//! name. Saves are atomic (temp file + rename) and callers performing a
//! read-modify-write hold a [`RegistryLock`] across the cycle.

pub mod lock;
pub mod record;
pub mod registry;

pub use lock::RegistryLock;
pub use record::ExecutableRecord;
pub use registry::{Registry, REGISTRY_FILE_NAME, SCHEMA_VERSION};
