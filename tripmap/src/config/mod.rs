//! Configuration file support.
//!
//! Settings live in an INI file at `~/.config/tripmap/config.ini` (or the
//! platform equivalent):
//!
//! ```ini
//! [tracking]
//! render_interval_ms = 1000
//! stationary_distance_m = 5
//! stationary_sample_limit = 6
//! max_hidden_secs = 300
//! max_consecutive_errors = 5
//! locate_zoom = 16
//!
//! [prefetch]
//! tile_url = https://tile.openstreetmap.org/{z}/{x}/{y}.png
//! cache_dir = ~/.cache/tripmap/tiles
//! delay_ms = 500
//! user_agent = tripmap/0.3.0
//! max_tiles = 100000
//!
//! [logging]
//! level = info
//! directory =
//! ```
//!
//! Missing keys keep their defaults.

mod error;
mod file;
mod keys;

use std::path::PathBuf;

pub use error::ConfigError;
pub use file::ConfigFile;
pub use keys::ConfigKey;

const APP_DIR: &str = "tripmap";
const CONFIG_FILE_NAME: &str = "config.ini";

/// Directory holding the configuration file.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Full path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Default tile cache directory.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("tiles")
}
