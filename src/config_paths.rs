//! Centralized configuration paths for mentionkit
//!
//! All config files live under:
//! - Unix/macOS: `~/.config/mentionkit/`
//! - Windows: `%APPDATA%\mentionkit\`

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::error::{MentionError, Result};

const APP_DIR: &str = "mentionkit";

/// Base config directory for mentionkit
///
/// Unix/macOS:
///   - If XDG_CONFIG_HOME is set: `$XDG_CONFIG_HOME/mentionkit`
///   - Else: `~/.config/mentionkit`
///
/// Windows:
///   - `%APPDATA%\mentionkit`
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_DIR))
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|config| config.join(APP_DIR))
    }
}

/// `~/.config/mentionkit/config.yaml`
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

/// `~/.config/mentionkit/logs/`
pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("logs"))
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| MentionError::ConfigWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Ensure logs dir exists, returning it
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir().ok_or(MentionError::NoConfigDir)?;
    ensure_dir(&logs)?;
    Ok(logs)
}
