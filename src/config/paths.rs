//! Where settings and the saved roster live.
//!
//! Everything sits in one directory, `<config_dir>/character-forge/`
//! (`%APPDATA%` on Windows, `~/Library/Application Support` on macOS,
//! `~/.config` on Linux).  Setting `CHARACTER_FORGE_HOME` replaces that
//! directory outright, which keeps test runs and portable installs away
//! from the user's real roster.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "character-forge";
const SETTINGS_FILE: &str = "settings.toml";
const SESSION_FILE: &str = "session.json";

/// Resolved locations of the application's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    /// `settings.toml`.
    pub settings_file: PathBuf,
    /// `session.json`, record data only.
    pub session_file: PathBuf,
}

impl AppPaths {
    /// Environment variable that overrides the platform directory.
    pub const HOME_ENV: &'static str = "CHARACTER_FORGE_HOME";

    /// Platform paths, or `$CHARACTER_FORGE_HOME` when set.  Falls back to
    /// `./character-forge` if the platform has no config directory.
    pub fn new() -> Self {
        if let Some(home) = std::env::var_os(Self::HOME_ENV).filter(|v| !v.is_empty()) {
            return Self::in_dir(home);
        }
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::in_dir(base.join(APP_DIR))
    }

    /// All files inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let config_dir = dir.as_ref().to_path_buf();
        Self {
            settings_file: config_dir.join(SETTINGS_FILE),
            session_file: config_dir.join(SESSION_FILE),
            config_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
