//! Manifest persistence in the XDG state directory
//!
//! The manifest is a single JSON document:
//! - Unix: `$XDG_STATE_HOME/gearbox/manifest.json` (fallback: `~/.local/share/gearbox/`)
//! - Windows: `%LOCALAPPDATA%\gearbox\manifest.json`
//!
//! Writes go to a temp file that is renamed over the target, and every
//! read-modify-write cycle runs under a single writer lock. Readers share the
//! lock, so concurrent installs can look up records while one of them
//! records a finished build.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use tracing::{debug, info};

use super::types::{BundleContents, InstallMethod, InstallationRecord, Manifest};
use crate::catalog::ToolSpec;
use crate::error::{GearboxError, Result};

pub const MANIFEST_FILE: &str = "manifest.json";

/// What the installer knows about a finished install.
#[derive(Debug, Clone, Default)]
pub struct InstallDetails {
    pub method: InstallMethod,
    pub version: String,
    pub binary_paths: Vec<PathBuf>,
    pub config_paths: Vec<PathBuf>,
    pub build_dir: Option<PathBuf>,
}

impl InstallDetails {
    pub fn new(method: InstallMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_paths.push(path.into());
        self
    }

    pub fn with_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_paths.push(path.into());
        self
    }

    pub fn with_build_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_dir = Some(path.into());
        self
    }
}

#[derive(Debug)]
pub struct ManifestStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    /// Store at `<dir>/manifest.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(MANIFEST_FILE))
    }

    /// Default state directory for the manifest
    ///
    /// # Returns
    /// - Unix: `$XDG_STATE_HOME/gearbox` or the local data dir
    /// - Windows: `%LOCALAPPDATA%\gearbox`
    pub fn default_state_dir() -> Result<PathBuf> {
        let base = if cfg!(unix) {
            dirs::state_dir().or_else(dirs::data_local_dir)
        } else {
            dirs::data_local_dir()
        };
        base.map(|b| b.join("gearbox"))
            .ok_or_else(|| GearboxError::config("Cannot determine state directory"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the manifest.
    ///
    /// A missing file is an empty manifest. An unreadable or invalid file is
    /// a [`GearboxError::Manifest`].
    pub fn load(&self) -> Result<Manifest> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        self.read_unlocked()
    }

    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        self.write_unlocked(manifest)
    }

    /// Load, modify and save under the writer lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut Manifest) -> R) -> Result<R> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        let mut manifest = self.read_unlocked()?;
        let out = f(&mut manifest);
        self.write_unlocked(&manifest)?;
        Ok(out)
    }

    pub fn get(&self, name: &str) -> Result<Option<InstallationRecord>> {
        Ok(self.load()?.get(name).cloned())
    }

    pub fn is_tracked(&self, name: &str) -> Result<bool> {
        Ok(self.load()?.contains(name))
    }

    /// All records, ordered by name.
    pub fn list(&self) -> Result<Vec<InstallationRecord>> {
        Ok(self.load()?.records().cloned().collect())
    }

    /// Record a successful install of `tool`, replacing any earlier record.
    pub fn track_installation(
        &self,
        tool: &ToolSpec,
        details: InstallDetails,
    ) -> Result<InstallationRecord> {
        let mut record = InstallationRecord::new(&tool.name, details.method);
        record.version = details.version;
        record.language = Some(tool.language.clone());
        record.dependencies = tool.dependencies.clone();
        record.binary_paths = details.binary_paths;
        record.config_paths = details.config_paths;
        record.build_dir = details.build_dir;

        debug!(tool = %tool.name, method = %record.method, "Tracking installation");
        self.upsert(record)
    }

    /// Record a bundle marker with its direct and expanded tool lists.
    pub fn track_bundle(
        &self,
        name: &str,
        tools: &[String],
        expanded: &[String],
    ) -> Result<InstallationRecord> {
        let mut record = InstallationRecord::new(name, InstallMethod::BundleMarker);
        record.bundle = Some(BundleContents {
            tools: tools.to_vec(),
            expanded: expanded.to_vec(),
        });
        debug!(bundle = name, tools = expanded.len(), "Tracking bundle");
        self.upsert(record)
    }

    /// Record a tool that was already on the system.
    pub fn track_pre_existing(
        &self,
        tool: &str,
        path: &Path,
        version: &str,
    ) -> Result<InstallationRecord> {
        let mut record = InstallationRecord::new(tool, InstallMethod::PreExisting);
        record.version = version.to_string();
        record.binary_paths = vec![path.to_path_buf()];
        debug!(tool, path = %path.display(), "Tracking pre-existing tool");
        self.upsert(record)
    }

    /// Remove a record. Returns the removed record, if any.
    pub fn remove(&self, name: &str) -> Result<Option<InstallationRecord>> {
        self.update(|m| m.remove(name))
    }

    /// Names of tracked entries that depend on `name`.
    pub fn dependents(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.load()?.dependents(name))
    }

    /// Copy the current manifest to a timestamped backup next to it.
    ///
    /// Returns `None` when there is nothing to back up yet.
    pub fn create_snapshot(&self, suffix: Option<&str>) -> Result<Option<PathBuf>> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        if !self.path.exists() {
            return Ok(None);
        }

        let stamp = Utc::now().format("%Y%m%d-%H%M%S%3f");
        let name = match suffix.filter(|s| !s.is_empty()) {
            Some(suffix) => format!("manifest.{stamp}.{suffix}.json"),
            None => format!("manifest.{stamp}.json"),
        };
        let backup = self.dir().join(name);
        fs::copy(&self.path, &backup).map_err(|e| {
            GearboxError::manifest(&self.path, format!("Failed to create snapshot: {e}"))
        })?;
        info!(backup = %backup.display(), "Created manifest snapshot");
        Ok(Some(backup))
    }

    fn upsert(&self, record: InstallationRecord) -> Result<InstallationRecord> {
        let name = record.name.clone();
        self.update(move |m| {
            m.upsert(record);
            m.get(&name).cloned()
        })?
        .ok_or_else(|| GearboxError::manifest(&self.path, "Record vanished after write"))
    }

    fn dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn read_unlocked(&self) -> Result<Manifest> {
        if !self.path.exists() {
            return Ok(Manifest::new());
        }
        let bytes = fs::read(&self.path)
            .map_err(|e| GearboxError::manifest(&self.path, format!("Failed to read: {e}")))?;
        let manifest: Manifest = serde_json::from_slice(&bytes)
            .map_err(|e| GearboxError::manifest(&self.path, format!("Failed to parse: {e}")))?;
        manifest
            .validate()
            .map_err(|e| GearboxError::manifest(&self.path, e.to_string()))?;
        Ok(manifest)
    }

    fn write_unlocked(&self, manifest: &Manifest) -> Result<()> {
        let dir = self.dir();
        fs::create_dir_all(&dir).map_err(|e| {
            GearboxError::manifest(&self.path, format!("Failed to create directory: {e}"))
        })?;

        let mut manifest = manifest.clone();
        manifest.updated_at = Utc::now();
        let bytes = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| GearboxError::manifest(&self.path, format!("Failed to serialize: {e}")))?;

        let tmp_path = dir.join(format!("{MANIFEST_FILE}.{}.tmp", std::process::id()));
        fs::write(&tmp_path, bytes).map_err(|e| {
            GearboxError::manifest(&tmp_path, format!("Failed to write temp file: {e}"))
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            GearboxError::manifest(&self.path, format!("Failed to replace manifest: {e}"))
        })?;
        Ok(())
    }
}
