//! Configuration file handling for ~/.config/creel/config.toml.
//!
//! The config records which database file to use and which user is
//! currently "logged in". A missing or empty file yields
//! `Config::default()`; `register` and `login` persist the current user
//! back to disk.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("HOME environment variable not set")]
    NoHome,
}

// ============================================================================
// Configuration
// ============================================================================

/// Get the config directory path (~/.config/creel/)
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(home).join(".config").join("creel"))
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified. Missing keys fall back to `Default::default()`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database. Defaults to `creel.db` in the config
    /// directory when unset.
    pub db_path: Option<PathBuf>,

    /// Name of the currently logged-in user, if any.
    pub current_user: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Record `name` as the current user and persist the config.
    pub fn set_user(&mut self, path: &Path, name: &str) -> Result<(), ConfigError> {
        self.current_user = Some(name.to_string());
        self.store(path)
    }

    /// Write the config using the write-to-temp-then-rename pattern so a
    /// crash never leaves a half-written file behind.
    pub fn store(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        let temp_path = path.with_extension("toml.tmp");
        std::fs::write(&temp_path, &content)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Database file location: the explicit `db_path`, or `creel.db` next
    /// to the config file.
    pub fn database_path(&self, config_dir: &Path) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| config_dir.join("creel.db"))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.db_path.is_none());
        assert!(config.current_user.is_none());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/creel_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert!(config.current_user.is_none());
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("creel_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.current_user.is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("creel_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "current_user = \"alice\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.current_user.as_deref(), Some("alice"));
        assert!(config.db_path.is_none()); // default

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_set_user_round_trip() {
        let dir = std::env::temp_dir().join("creel_config_test_set_user");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let mut config = Config::load(&path).unwrap();
        config.set_user(&path, "alice").unwrap();

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.current_user.as_deref(), Some("alice"));

        // Switching users overwrites the previous value
        let mut config = reloaded;
        config.set_user(&path, "bob").unwrap();
        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.current_user.as_deref(), Some("bob"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("creel_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_database_path_default_and_override() {
        let config_dir = Path::new("/home/alice/.config/creel");

        let config = Config::default();
        assert_eq!(
            config.database_path(config_dir),
            config_dir.join("creel.db")
        );

        let config = Config {
            db_path: Some(PathBuf::from("/var/lib/creel/feeds.db")),
            current_user: None,
        };
        assert_eq!(
            config.database_path(config_dir),
            PathBuf::from("/var/lib/creel/feeds.db")
        );
    }
}
