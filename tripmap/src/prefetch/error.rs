use std::path::PathBuf;

use thiserror::Error;

use crate::geo::TileError;

/// Errors from planning or running a tile download.
#[derive(Debug, Error)]
pub enum PrefetchError {
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Invalid zoom range {min}..={max}")]
    InvalidZoomRange { min: u8, max: u8 },

    #[error("Area needs {count} tiles, more than the limit of {limit}")]
    TooManyTiles { count: u64, limit: u64 },

    #[error(transparent)]
    Tile(#[from] TileError),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Tile storage error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
