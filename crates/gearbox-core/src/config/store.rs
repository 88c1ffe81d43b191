//! Loading and saving `config.toml`.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::GearboxSettings;
use crate::error::{GearboxError, Result};

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means defaults; a malformed one is a config error.
    pub fn load(&self) -> Result<GearboxSettings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No settings file, using defaults");
            return Ok(GearboxSettings::default());
        }
        let settings: GearboxSettings = crate::catalog::parser::parse_file(&self.path)?;
        settings
            .validate()
            .map_err(|e| GearboxError::config(format!("{}: {e}", self.path.display())))?;
        Ok(settings)
    }

    pub fn save(&self, settings: &GearboxSettings) -> Result<()> {
        let content = settings.to_toml()?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SafetyLevel;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_defaults() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::new(temp.path().join("config.toml"));
        assert_eq!(store.load().unwrap(), GearboxSettings::default());
    }

    #[test]
    fn save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::new(temp.path().join("nested").join("config.toml"));
        let settings = GearboxSettings {
            safety_level: SafetyLevel::Aggressive,
            max_parallel_jobs: 3,
            ..Default::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn malformed_file_names_the_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "safety_level = \"reckless\"\n").unwrap();
        let err = SettingsStore::new(&path).load().unwrap_err();
        assert!(matches!(err, GearboxError::Config { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
