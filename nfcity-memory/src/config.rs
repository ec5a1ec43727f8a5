//! Key configuration
//!
//! Keys offered when authenticating a sector, stored as JSON in
//! `~/.nfcity/keys.json`. The directory can be moved with
//! `NFCITY_CONFIG_DIR`, and `NFCITY_DEFAULT_KEY` (hex) overrides the
//! default key A.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::picc::{Key, KeyError, KeyType, DEFAULT_KEY};

/// Errors that can occur when loading or saving the key configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid key configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid key: {0}")]
    Key(#[from] KeyError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Key tried first on every sector
    pub default_key: Key,
    /// Additional known keys
    pub keys: Vec<Key>,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            default_key: DEFAULT_KEY,
            keys: Vec::new(),
        }
    }
}

impl KeyConfig {
    const CONFIG_FILE: &'static str = "keys.json";
    const DEFAULT_KEY_ENV: &'static str = "NFCITY_DEFAULT_KEY";

    /// Get the default configuration directory
    pub fn default_dir() -> PathBuf {
        if let Ok(path) = std::env::var("NFCITY_CONFIG_DIR") {
            return PathBuf::from(path);
        }
        if let Some(home) = dirs::home_dir() {
            return home.join(".nfcity");
        }
        PathBuf::from(".nfcity")
    }

    /// Load `keys.json` from `dir` (or the default directory)
    ///
    /// A missing or unreadable file yields the defaults. The
    /// `NFCITY_DEFAULT_KEY` override is applied afterwards.
    pub fn load(dir: Option<&Path>) -> Self {
        let dir = dir.map(Path::to_path_buf).unwrap_or_else(Self::default_dir);
        let mut config = match Self::read(&dir.join(Self::CONFIG_FILE)) {
            Ok(Some(config)) => {
                info!("Loaded key configuration from {:?}", dir);
                config
            }
            Ok(None) => {
                debug!("No key configuration in {:?}, using defaults", dir);
                Self::default()
            }
            Err(e) => {
                warn!("Failed to load key configuration: {}", e);
                Self::default()
            }
        };

        if let Ok(value) = std::env::var(Self::DEFAULT_KEY_ENV) {
            match config.override_default_key(&value) {
                Ok(()) => info!("Default key taken from {}", Self::DEFAULT_KEY_ENV),
                Err(e) => warn!("Ignoring {}: {}", Self::DEFAULT_KEY_ENV, e),
            }
        }
        config
    }

    fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Save to `keys.json` in `dir`, creating the directory if needed
    pub fn save(&self, dir: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(Self::CONFIG_FILE), json)?;
        debug!("Saved key configuration to {:?}", dir);
        Ok(())
    }

    /// Replace the default key A with a hex value
    pub fn override_default_key(&mut self, hex: &str) -> Result<(), ConfigError> {
        self.default_key = Key::from_hex(KeyType::A, hex)?;
        Ok(())
    }

    /// All configured keys, default key first, without duplicates
    pub fn candidates(&self) -> Vec<Key> {
        let mut keys = vec![self.default_key];
        for key in &self.keys {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = KeyConfig::read(&temp_dir.path().join("keys.json")).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = KeyConfig::default();
        config.keys.push(Key::new(KeyType::B, [0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5]));
        config.save(temp_dir.path()).unwrap();

        let loaded = KeyConfig::read(&temp_dir.path().join("keys.json")).unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_dir() {
        let temp_dir = TempDir::new().unwrap();
        let extra = Key::new(KeyType::A, [0xB0; 6]);
        let config = KeyConfig {
            keys: vec![extra],
            ..KeyConfig::default()
        };
        config.save(temp_dir.path()).unwrap();

        let loaded = KeyConfig::load(Some(temp_dir.path()));
        assert_eq!(loaded.keys, vec![extra]);

        let empty = TempDir::new().unwrap();
        assert!(KeyConfig::load(Some(empty.path())).keys.is_empty());
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("keys.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(KeyConfig::read(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("keys.json");
        fs::write(&path, r#"{"keys": [{"type": "B", "value": "000000000000"}]}"#).unwrap();

        let config = KeyConfig::read(&path).unwrap().unwrap();
        assert_eq!(config.default_key, DEFAULT_KEY);
        assert_eq!(config.keys, vec![Key::new(KeyType::B, [0; 6])]);
    }

    #[test]
    fn test_override_default_key() {
        let mut config = KeyConfig::default();
        config.override_default_key("D3F7D3F7D3F7").unwrap();
        assert_eq!(config.default_key, Key::new(KeyType::A, [0xD3, 0xF7, 0xD3, 0xF7, 0xD3, 0xF7]));
        assert!(matches!(
            config.override_default_key("D3F7"),
            Err(ConfigError::Key(KeyError::InvalidLength(2)))
        ));
    }

    #[test]
    fn test_candidates_deduplicated() {
        let config = KeyConfig {
            default_key: DEFAULT_KEY,
            keys: vec![DEFAULT_KEY, Key::new(KeyType::B, [0; 6])],
        };
        assert_eq!(config.candidates(), vec![DEFAULT_KEY, Key::new(KeyType::B, [0; 6])]);
    }
}
