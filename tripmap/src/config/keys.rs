//! User-settable configuration keys.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::geo::MAX_ZOOM;

use super::{ConfigError, ConfigFile};

const TRACKING: &str = "tracking";
const PREFETCH: &str = "prefetch";
const LOGGING: &str = "logging";

/// A `section.key` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    TrackingRenderIntervalMs,
    TrackingStationaryDistanceM,
    TrackingStationarySampleLimit,
    TrackingMaxHiddenSecs,
    TrackingMaxConsecutiveErrors,
    TrackingLocateZoom,
    PrefetchTileUrl,
    PrefetchCacheDir,
    PrefetchDelayMs,
    PrefetchUserAgent,
    PrefetchMaxTiles,
    LoggingLevel,
    LoggingDirectory,
}

impl ConfigKey {
    /// Every key, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::TrackingRenderIntervalMs,
            ConfigKey::TrackingStationaryDistanceM,
            ConfigKey::TrackingStationarySampleLimit,
            ConfigKey::TrackingMaxHiddenSecs,
            ConfigKey::TrackingMaxConsecutiveErrors,
            ConfigKey::TrackingLocateZoom,
            ConfigKey::PrefetchTileUrl,
            ConfigKey::PrefetchCacheDir,
            ConfigKey::PrefetchDelayMs,
            ConfigKey::PrefetchUserAgent,
            ConfigKey::PrefetchMaxTiles,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingDirectory,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::TrackingRenderIntervalMs
            | ConfigKey::TrackingStationaryDistanceM
            | ConfigKey::TrackingStationarySampleLimit
            | ConfigKey::TrackingMaxHiddenSecs
            | ConfigKey::TrackingMaxConsecutiveErrors
            | ConfigKey::TrackingLocateZoom => TRACKING,
            ConfigKey::PrefetchTileUrl
            | ConfigKey::PrefetchCacheDir
            | ConfigKey::PrefetchDelayMs
            | ConfigKey::PrefetchUserAgent
            | ConfigKey::PrefetchMaxTiles => PREFETCH,
            ConfigKey::LoggingLevel | ConfigKey::LoggingDirectory => LOGGING,
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::TrackingRenderIntervalMs => "render_interval_ms",
            ConfigKey::TrackingStationaryDistanceM => "stationary_distance_m",
            ConfigKey::TrackingStationarySampleLimit => "stationary_sample_limit",
            ConfigKey::TrackingMaxHiddenSecs => "max_hidden_secs",
            ConfigKey::TrackingMaxConsecutiveErrors => "max_consecutive_errors",
            ConfigKey::TrackingLocateZoom => "locate_zoom",
            ConfigKey::PrefetchTileUrl => "tile_url",
            ConfigKey::PrefetchCacheDir => "cache_dir",
            ConfigKey::PrefetchDelayMs => "delay_ms",
            ConfigKey::PrefetchUserAgent => "user_agent",
            ConfigKey::PrefetchMaxTiles => "max_tiles",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingDirectory => "directory",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Look a key up by section and key name.
    pub fn lookup(section: &str, key: &str) -> Option<ConfigKey> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.section() == section && k.key_name() == key)
    }

    /// Current value as it would be written to the file. Empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        let tracking = &config.tracking;
        let prefetch = &config.prefetch;
        match self {
            ConfigKey::TrackingRenderIntervalMs => tracking.render_interval.as_millis().to_string(),
            ConfigKey::TrackingStationaryDistanceM => tracking.stationary_distance_m.to_string(),
            ConfigKey::TrackingStationarySampleLimit => {
                tracking.stationary_sample_limit.to_string()
            }
            ConfigKey::TrackingMaxHiddenSecs => tracking.max_hidden.as_secs().to_string(),
            ConfigKey::TrackingMaxConsecutiveErrors => tracking.max_consecutive_errors.to_string(),
            ConfigKey::TrackingLocateZoom => tracking.locate_zoom.to_string(),
            ConfigKey::PrefetchTileUrl => prefetch.tile_url.clone(),
            ConfigKey::PrefetchCacheDir => prefetch.cache_dir.display().to_string(),
            ConfigKey::PrefetchDelayMs => prefetch.delay.as_millis().to_string(),
            ConfigKey::PrefetchUserAgent => prefetch.user_agent.clone(),
            ConfigKey::PrefetchMaxTiles => prefetch.max_tiles.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Validate and apply a value.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::TrackingRenderIntervalMs => {
                let ms: u64 = self.parse(value)?;
                if ms == 0 {
                    return Err(self.invalid(value, "must be greater than zero"));
                }
                config.tracking.render_interval = Duration::from_millis(ms);
            }
            ConfigKey::TrackingStationaryDistanceM => {
                let meters: f64 = self.parse(value)?;
                if !meters.is_finite() || meters <= 0.0 {
                    return Err(self.invalid(value, "must be a positive distance"));
                }
                config.tracking.stationary_distance_m = meters;
            }
            ConfigKey::TrackingStationarySampleLimit => {
                config.tracking.stationary_sample_limit = self.parse(value)?;
            }
            ConfigKey::TrackingMaxHiddenSecs => {
                config.tracking.max_hidden = Duration::from_secs(self.parse(value)?);
            }
            ConfigKey::TrackingMaxConsecutiveErrors => {
                let limit: u32 = self.parse(value)?;
                if limit == 0 {
                    return Err(self.invalid(value, "must be at least 1"));
                }
                config.tracking.max_consecutive_errors = limit;
            }
            ConfigKey::TrackingLocateZoom => {
                let zoom: u8 = self.parse(value)?;
                if zoom > MAX_ZOOM {
                    return Err(self.invalid(value, &format!("must be at most {}", MAX_ZOOM)));
                }
                config.tracking.locate_zoom = zoom;
            }
            ConfigKey::PrefetchTileUrl => {
                for placeholder in ["{z}", "{x}", "{y}"] {
                    if !value.contains(placeholder) {
                        return Err(self.invalid(value, &format!("missing {}", placeholder)));
                    }
                }
                config.prefetch.tile_url = value.to_string();
            }
            ConfigKey::PrefetchCacheDir => {
                if value.is_empty() {
                    return Err(self.invalid(value, "must not be empty"));
                }
                config.prefetch.cache_dir = PathBuf::from(value);
            }
            ConfigKey::PrefetchDelayMs => {
                config.prefetch.delay = Duration::from_millis(self.parse(value)?);
            }
            ConfigKey::PrefetchUserAgent => {
                if value.is_empty() {
                    return Err(self.invalid(value, "must not be empty"));
                }
                config.prefetch.user_agent = value.to_string();
            }
            ConfigKey::PrefetchMaxTiles => {
                let limit: u64 = self.parse(value)?;
                if limit == 0 {
                    return Err(self.invalid(value, "must be at least 1"));
                }
                config.prefetch.max_tiles = limit;
            }
            ConfigKey::LoggingLevel => {
                tracing_subscriber::EnvFilter::try_new(value)
                    .map_err(|e| self.invalid(value, &e.to_string()))?;
                config.logging.level = value.to_string();
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
        }
        Ok(())
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigError> {
        value
            .parse()
            .map_err(|_| self.invalid(value, "not a valid number"))
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.section().to_string(),
            key: self.key_name().to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_once('.')
            .and_then(|(section, key)| ConfigKey::lookup(section, key))
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_keys() {
        for key in ConfigKey::all() {
            let parsed: ConfigKey = key.name().parse().unwrap();
            assert_eq!(parsed, *key);
        }
    }

    #[test]
    fn test_parse_unknown_key() {
        assert!(matches!(
            "tracking.nope".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!("no_dot".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_get_defaults() {
        let config = ConfigFile::default();
        assert_eq!(ConfigKey::TrackingRenderIntervalMs.get(&config), "1000");
        assert_eq!(ConfigKey::TrackingMaxHiddenSecs.get(&config), "300");
        assert_eq!(ConfigKey::TrackingLocateZoom.get(&config), "16");
        assert_eq!(ConfigKey::PrefetchDelayMs.get(&config), "500");
        assert_eq!(ConfigKey::PrefetchMaxTiles.get(&config), "100000");
        assert_eq!(ConfigKey::LoggingDirectory.get(&config), "");
    }

    #[test]
    fn test_set_updates_config() {
        let mut config = ConfigFile::default();
        ConfigKey::TrackingMaxHiddenSecs
            .set(&mut config, "120")
            .unwrap();
        ConfigKey::TrackingStationaryDistanceM
            .set(&mut config, " 7.5 ")
            .unwrap();
        assert_eq!(config.tracking.max_hidden, Duration::from_secs(120));
        assert_eq!(config.tracking.stationary_distance_m, 7.5);
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = ConfigFile::default();
        let err = ConfigKey::TrackingRenderIntervalMs
            .set(&mut config, "fast")
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { section, key, .. } => {
                assert_eq!(section, "tracking");
                assert_eq!(key, "render_interval_ms");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(ConfigKey::TrackingRenderIntervalMs
            .set(&mut config, "0")
            .is_err());
        assert!(ConfigKey::TrackingMaxConsecutiveErrors
            .set(&mut config, "0")
            .is_err());
        assert!(ConfigKey::TrackingLocateZoom.set(&mut config, "25").is_err());
        assert!(ConfigKey::PrefetchMaxTiles.set(&mut config, "0").is_err());
        assert!(ConfigKey::PrefetchTileUrl
            .set(&mut config, "https://example.com/{z}/{x}.png")
            .is_err());
    }

    #[test]
    fn test_empty_directory_unsets() {
        let mut config = ConfigFile::default();
        ConfigKey::LoggingDirectory
            .set(&mut config, "/var/log/tripmap")
            .unwrap();
        assert!(config.logging.directory.is_some());
        ConfigKey::LoggingDirectory.set(&mut config, "").unwrap();
        assert!(config.logging.directory.is_none());
    }
}
