//! Mention configuration persistence
//!
//! Stores options in `~/.config/mentionkit/config.yaml`

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::DEFAULT_DELIMITER;
use crate::error::{MentionError, Result};

/// Recognized options for one mention-enabled field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionConfig {
    /// Character that opens a trigger and leads every encoded token
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Overrides the trigger grammar; must match at end of input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_pattern: Option<String>,

    /// Overrides the encoded-token grammar used by `decode`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decode_pattern: Option<String>,

    /// CSS class of the default highlight wrapper
    #[serde(default = "default_highlight_class")]
    pub highlight_class: String,
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

fn default_highlight_class() -> String {
    "mention".to_string()
}

impl Default for MentionConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            search_pattern: None,
            decode_pattern: None,
            highlight_class: default_highlight_class(),
        }
    }
}

impl MentionConfig {
    /// Load config from disk, or return defaults if missing or unreadable
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load config from an explicit path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| MentionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let path = crate::config_paths::config_file().ok_or(MentionError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Save config to `path`, creating parent directories
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let write_err = |source| MentionError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).map_err(write_err)?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = MentionConfig::from_yaml_str("highlight_class: tag\n").unwrap();
        assert_eq!(config.delimiter, '$');
        assert_eq!(config.highlight_class, "tag");
        assert!(config.search_pattern.is_none());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let err = MentionConfig::from_yaml_str("delimiter: [1, 2]").unwrap_err();
        assert!(matches!(err, MentionError::ConfigParse(_)));
    }
}
