use std::path::PathBuf;
use std::time::Duration;

use crate::config::default_cache_dir;

/// OpenStreetMap standard tile layer.
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Pause after each network fetch. Keeps the run at two requests per
/// second, the public tile server's limit.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Largest tile plan accepted for one run. About 14 hours at the default
/// delay.
pub const DEFAULT_MAX_TILES: u64 = 100_000;

/// Per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for offline tile downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchConfig {
    /// URL template with `{z}`, `{x}` and `{y}` placeholders.
    pub tile_url: String,
    pub cache_dir: PathBuf,
    pub delay: Duration,
    pub user_agent: String,
    pub timeout: Duration,
    /// Upper bound on the tiles planned for one run.
    pub max_tiles: u64,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            tile_url: DEFAULT_TILE_URL.to_string(),
            cache_dir: default_cache_dir(),
            delay: DEFAULT_REQUEST_DELAY,
            user_agent: default_user_agent(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            max_tiles: DEFAULT_MAX_TILES,
        }
    }
}

impl PrefetchConfig {
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_max_tiles(mut self, max_tiles: u64) -> Self {
        self.max_tiles = max_tiles;
        self
    }

    pub fn with_tile_url(mut self, tile_url: impl Into<String>) -> Self {
        self.tile_url = tile_url.into();
        self
    }
}

/// `tripmap/<version>`.
pub fn default_user_agent() -> String {
    format!("tripmap/{}", crate::VERSION)
}
