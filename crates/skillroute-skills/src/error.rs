//! Error types for manifest loading.

use std::path::PathBuf;

/// Errors raised while discovering, parsing, or binding a skill manifest.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no skill.json or skill.toml in `{0}`")]
    NotFound(PathBuf),

    #[error("invalid skill manifest `{path}`: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("missing required field `{field}` in skill manifest `{path}`")]
    MissingField { path: PathBuf, field: String },

    #[error("unsupported manifest `{path}`: {reason}")]
    Unsupported { path: PathBuf, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LoadError>;
