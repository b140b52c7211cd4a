//! Construction-time errors
//!
//! The editing path never fails: malformed values are coerced and offsets
//! clamped. Only building the engine (patterns, config files) can error.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MentionError {
    #[error("invalid search pattern `{pattern}`: {source}")]
    SearchPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid decode pattern `{pattern}`: {source}")]
    DecodePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("no config directory available")]
    NoConfigDir,

    #[error("failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("failed to write config to {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, MentionError>;
