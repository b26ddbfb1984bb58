//! # Settings Loader
//!
//! Centralized settings loading for the positions dashboard binaries.
//! Settings live in a JSON file (`settings.json` by default) and every field is
//! optional, so a missing file or an empty object both resolve to
//! [`Settings::default`].
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use settings_loader;
//! use std::path::PathBuf;
//!
//! // Load settings from a specific path
//! let settings = settings_loader::load_settings("config/my_settings.json")?;
//!
//! // Provided path, then ./settings.json, then defaults; env vars applied last
//! let path = Some(PathBuf::from("settings.json"));
//! let settings = settings_loader::resolve_settings(path.as_ref())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
pub use models::Settings;

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

pub const ENV_DASHBOARD_PATH: &str = "POSITIONS_DASHBOARD_PATH";
pub const ENV_AS_OF: &str = "POSITIONS_AS_OF";
pub const ENV_LOG: &str = "POSITIONS_LOG";

/// Loads settings from a JSON file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading settings file: {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("Parsing settings JSON in {}", path.display()))?;
    Ok(settings)
}

/// Loads settings from a default location (settings.json in the current directory)
pub fn load_default_settings() -> Result<Settings> {
    load_settings(DEFAULT_SETTINGS_FILE)
}

/// Loads settings from an optional path, returning None if no path is provided
pub fn load_optional_settings(path: Option<&PathBuf>) -> Result<Option<Settings>> {
    match path {
        Some(settings_path) => Ok(Some(load_settings(settings_path)?)),
        None => Ok(None),
    }
}

/// Tries the provided path, then the default location. Falls back to
/// `Settings::default()` when neither exists. A file that exists but does not
/// parse is an error.
pub fn load_settings_with_fallback(path: Option<&PathBuf>) -> Result<Settings> {
    if let Some(settings_path) = path {
        if settings_file_exists(settings_path) {
            return load_settings(settings_path);
        }
        tracing::warn!(
            path = %settings_path.display(),
            "settings file not found, trying {}",
            DEFAULT_SETTINGS_FILE
        );
    }

    if default_settings_exist() {
        return load_default_settings();
    }

    tracing::debug!("no settings file found, using defaults");
    Ok(Settings::default())
}

/// Overrides settings from `POSITIONS_*` environment variables.
pub fn apply_env_overrides(settings: Settings) -> Result<Settings> {
    apply_overrides_from(settings, |key| env::var(key).ok())
}

fn apply_overrides_from<F>(mut settings: Settings, lookup: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(ENV_DASHBOARD_PATH).filter(|v| !v.trim().is_empty()) {
        settings.dashboard_path = PathBuf::from(path.trim());
    }
    if let Some(raw) = lookup(ENV_AS_OF).filter(|v| !v.trim().is_empty()) {
        let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("{} must be YYYY-MM-DD, got '{}'", ENV_AS_OF, raw))?;
        settings.as_of = Some(date);
    }
    if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
        settings.log_filter = filter.trim().to_string();
    }
    Ok(settings)
}

/// Fallback chain followed by env overrides; what the binaries call.
pub fn resolve_settings(path: Option<&PathBuf>) -> Result<Settings> {
    apply_env_overrides(load_settings_with_fallback(path)?)
}

/// Checks if a settings file exists at the given path
pub fn settings_file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists() && path.as_ref().is_file()
}

/// Checks if the default settings file (settings.json) exists
pub fn default_settings_exist() -> bool {
    settings_file_exists(DEFAULT_SETTINGS_FILE)
}
