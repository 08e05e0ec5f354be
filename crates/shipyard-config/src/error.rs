//! Error types for contexts file handling.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("contexts file not found: {0} (create one with `shipyard context init`)")]
    NotFound(PathBuf),

    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid contexts file syntax: {0}")]
    InvalidSyntax(String),

    #[error("profile '{0}' was not found in the contexts file")]
    ProfileNotFound(String),

    #[error("profile '{profile}' has an invalid url '{url}': {reason}")]
    InvalidUrl {
        profile: String,
        url: String,
        reason: String,
    },
}
