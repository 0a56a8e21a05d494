//! Demo settings.
//!
//! Read from `widgets.toml` when it exists, with `EASY_SCOPING_*` environment
//! overrides applied, and from the environment alone otherwise.

use std::path::Path;

use easy_scoping_core::settings_loader;
use easy_scoping_core::{ScopingResult, Settings};

/// Default settings file, relative to the working directory.
pub const SETTINGS_FILE: &str = "widgets.toml";

/// Loads the demo settings from `path`, or from the environment if the file
/// does not exist.
pub fn load_settings(path: impl AsRef<Path>) -> ScopingResult<Settings> {
    let path = path.as_ref();
    if path.exists() {
        tracing::info!(path = %path.display(), "loading settings");
        settings_loader::from_toml_file_with_env(path)
    } else {
        Ok(settings_loader::from_env())
    }
}

/// Reads an unsigned integer from the `[extra]` table.
pub fn extra_u64(settings: &Settings, key: &str, default: u64) -> u64 {
    settings
        .extra
        .get(key)
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(default)
}
