//! CLI subcommands.

pub mod config;
pub mod prefetch;
pub mod simulate;

use crate::error::CliError;

/// Single-threaded runtime for commands that need async.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(format!("Failed to start async runtime: {}", e)))
}
