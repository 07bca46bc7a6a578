// Configuration loaded from YAML

use crate::slot::{DEFAULT_KEY, JsonFileSlot, Slot, SqliteSlot};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where tasks are persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persistence slot
    pub store_dir: PathBuf,
    pub backend: Backend,
    /// Slot key
    pub key: String,
    /// Directory exports are written to
    pub export_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: dirs::data_dir()
                .map(|d| d.join("todostore"))
                .unwrap_or_else(|| PathBuf::from(".")),
            backend: Backend::default(),
            key: DEFAULT_KEY.to_string(),
            export_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// `<config dir>/todostore/todostore.yml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("todostore").join("todostore.yml"))
    }

    /// Load from an explicit path, or from the default path if it exists
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_file(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context(format!("Failed to read config file {:?}", path))?;
        let config: Config =
            serde_yaml::from_str(&content).context(format!("Failed to parse config file {:?}", path))?;
        debug!(path = ?path, "Loaded config");
        Ok(config)
    }

    /// Open the configured persistence slot
    pub fn open_slot(&self) -> Result<Box<dyn Slot>> {
        let slot: Box<dyn Slot> = match self.backend {
            Backend::Sqlite => Box::new(SqliteSlot::open(&self.store_dir, &self.key)?),
            Backend::Json => Box::new(JsonFileSlot::open(&self.store_dir, &self.key)?),
        };
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.key, "todos");
        assert_eq!(config.export_dir, PathBuf::from("."));
    }

    #[test]
    fn test_load_partial_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("todostore.yml");
        fs::write(&path, "backend: json\nkey: work\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.backend, Backend::Json);
        assert_eq!(config.key, "work");
        assert_eq!(config.store_dir, Config::default().store_dir);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let temp = TempDir::new().unwrap();
        assert!(Config::load(Some(&temp.path().join("missing.yml"))).is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("todostore.yml");
        fs::write(&path, "backend: [not, a, backend]\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_open_slot_per_backend() {
        let temp = TempDir::new().unwrap();
        let mut config = Config {
            store_dir: temp.path().to_path_buf(),
            ..Config::default()
        };

        let mut slot = config.open_slot().unwrap();
        slot.write("[]").unwrap();
        assert!(temp.path().join("todostore.db").exists());

        config.backend = Backend::Json;
        let mut slot = config.open_slot().unwrap();
        slot.write("[]").unwrap();
        assert!(temp.path().join("todos.json").exists());
    }
}
