//! Configuration and scratch paths

use std::path::{Path, PathBuf};

/// Name used for the config directory
const APP_NAME: &str = "e2e-driver";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/e2e-driver/`
/// - macOS: `~/Library/Application Support/e2e-driver/`
/// - Windows: `%APPDATA%\e2e-driver\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
///
/// `E2E_DRIVER_CONFIG` overrides the platform location.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("E2E_DRIVER_CONFIG") {
        return Some(PathBuf::from(path));
    }
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Resolve `path` against `base` unless it is already absolute
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}
