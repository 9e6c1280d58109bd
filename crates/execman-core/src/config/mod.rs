//! Settings loading

mod loader;

pub use loader::{SettingsLoader, SETTINGS_FILE_NAME};
