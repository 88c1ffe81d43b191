//! Directory layout resolution.

use std::path::{Path, PathBuf};

use super::GearboxSettings;
use crate::error::{GearboxError, Result};

pub const SETTINGS_FILE: &str = "config.toml";
pub const TOOLS_FILE: &str = "tools.toml";
pub const BUNDLES_FILE: &str = "bundles.toml";

/// Every directory gearbox reads from or writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GearboxPaths {
    pub config_dir: PathBuf,
    pub state_dir: PathBuf,
    pub catalog_dir: PathBuf,
    pub scripts_dir: PathBuf,
    pub install_dir: PathBuf,
    pub build_dir: PathBuf,
}

impl GearboxPaths {
    /// Detect the per-user directories.
    ///
    /// # Returns
    /// - config: `<config_dir>/gearbox`
    /// - state: `<state_dir>/gearbox` (local data dir where there is no state dir)
    /// - binaries: `~/.local/bin`
    pub fn detect() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| GearboxError::config("Could not determine config directory"))?
            .join("gearbox");
        let state_dir = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .ok_or_else(|| GearboxError::config("Could not determine state directory"))?
            .join("gearbox");
        let home = dirs::home_dir()
            .ok_or_else(|| GearboxError::config("Could not determine home directory"))?;
        Ok(Self::from_dirs(
            config_dir,
            state_dir,
            home.join(".local").join("bin"),
        ))
    }

    /// Layout rooted at explicit directories; catalog, scripts and builds
    /// default to subdirectories of them.
    pub fn from_dirs(config_dir: PathBuf, state_dir: PathBuf, install_dir: PathBuf) -> Self {
        Self {
            catalog_dir: config_dir.clone(),
            scripts_dir: config_dir.join("scripts"),
            build_dir: state_dir.join("build"),
            config_dir,
            state_dir,
            install_dir,
        }
    }

    /// Self-contained layout under `root`, used by tests and sandboxes.
    pub fn under(root: &Path) -> Self {
        Self::from_dirs(root.join("config"), root.join("state"), root.join("bin"))
    }

    /// Apply directory overrides from the settings file.
    pub fn apply_settings(&mut self, settings: &GearboxSettings) {
        let overrides = [
            (&mut self.install_dir, &settings.install_dir),
            (&mut self.build_dir, &settings.build_dir),
            (&mut self.scripts_dir, &settings.scripts_dir),
            (&mut self.catalog_dir, &settings.catalog_dir),
        ];
        for (dir, value) in overrides {
            if let Some(value) = value {
                *dir = value.clone();
            }
        }
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    pub fn tools_file(&self) -> PathBuf {
        self.catalog_dir.join(TOOLS_FILE)
    }

    pub fn bundles_file(&self) -> PathBuf {
        self.catalog_dir.join(BUNDLES_FILE)
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.state_dir.join(crate::manifest::MANIFEST_FILE)
    }
}
