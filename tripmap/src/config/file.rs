use std::path::{Path, PathBuf};

use ini::Ini;

use crate::logging::LoggingConfig;
use crate::prefetch::PrefetchConfig;
use crate::tracking::TrackingConfig;

use super::{config_file_path, ConfigError, ConfigKey};

/// Contents of `config.ini`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub tracking: TrackingConfig,
    pub prefetch: PrefetchConfig,
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Load from the default location, or defaults if the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(e) => ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;
        Self::from_ini(&ini)
    }

    /// Save to the default location, creating the directory if needed.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = config_file_path();
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save to a specific file.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        self.to_ini()
            .write_to_file(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (section, properties) in ini.iter() {
            let section = section.unwrap_or_default();
            for (key, value) in properties.iter() {
                match ConfigKey::lookup(section, key) {
                    Some(config_key) => config_key.set(&mut config, value)?,
                    None => tracing::warn!(section, key, "Ignoring unknown config key"),
                }
            }
        }

        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_keys_use_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[tracking]\nmax_hidden_secs = 60\n").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.tracking.max_hidden, Duration::from_secs(60));
        assert_eq!(config.tracking.render_interval, Duration::from_millis(1000));
        assert_eq!(config.prefetch.delay, Duration::from_millis(500));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        ConfigKey::TrackingLocateZoom.set(&mut config, "15").unwrap();
        ConfigKey::PrefetchCacheDir
            .set(&mut config, "/tmp/tiles")
            .unwrap();
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded.tracking.locate_zoom, 15);
        assert_eq!(loaded.prefetch.cache_dir, PathBuf::from("/tmp/tiles"));
        assert!(loaded.logging.directory.is_none());
    }

    #[test]
    fn test_invalid_value_names_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[tracking]\nlocate_zoom = high\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("tracking.locate_zoom"));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[tracking]\nwhatever = 1\n[other]\nx = y\n").unwrap();

        assert!(ConfigFile::load_from(&path).is_ok());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = ConfigFile::load_from(&temp.path().join("absent.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
