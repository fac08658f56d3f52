//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;
use tripmap::config::ConfigError;
use tripmap::prefetch::PrefetchError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("Prefetch failed: {0}")]
    Prefetch(#[from] PrefetchError),

    #[error("Invalid script {path}: {message}")]
    Script { path: PathBuf, message: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Runtime error: {0}")]
    Runtime(String),
}
