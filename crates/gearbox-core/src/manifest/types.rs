//! Manifest types for tracked installations.
//!
//! One record per installed tool or bundle marker, keyed by name.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GearboxError, Result};

pub const MANIFEST_VERSION: u32 = 1;

/// How a tracked entry got onto the system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum InstallMethod {
    /// Built from source by a build script.
    #[default]
    SourceBuild,
    /// Installed through cargo, go, pipx or npm.
    LanguagePackageManager,
    /// Installed through the distribution package manager.
    SystemPackage,
    /// Found on the system before gearbox managed it.
    PreExisting,
    /// Marker recording that a bundle was installed.
    BundleMarker,
}

impl InstallMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceBuild => "source-build",
            Self::LanguagePackageManager => "language-package-manager",
            Self::SystemPackage => "system-package",
            Self::PreExisting => "pre-existing",
            Self::BundleMarker => "bundle-marker",
        }
    }
}

impl fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tools recorded on a bundle marker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BundleContents {
    /// Tools listed directly in the bundle.
    #[serde(default)]
    pub tools: Vec<String>,

    /// Full tool list after expanding included bundles.
    #[serde(default)]
    pub expanded: Vec<String>,
}

impl BundleContents {
    /// Member tools to consider for removal, preferring the expanded list.
    pub fn members(&self) -> &[String] {
        if self.expanded.is_empty() {
            &self.tools
        } else {
            &self.expanded
        }
    }
}

/// A single tracked tool or bundle marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationRecord {
    pub name: String,

    pub method: InstallMethod,

    #[serde(default)]
    pub version: String,

    /// Language of the tool, needed to pick the language package manager.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Names this entry depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub binary_paths: Vec<PathBuf>,

    #[serde(default)]
    pub config_paths: Vec<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<PathBuf>,

    /// Present only on bundle markers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<BundleContents>,

    pub installed_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl InstallationRecord {
    pub fn new(name: impl Into<String>, method: InstallMethod) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            method,
            version: String::new(),
            language: None,
            dependencies: Vec::new(),
            binary_paths: Vec::new(),
            config_paths: Vec::new(),
            build_dir: None,
            bundle: None,
            installed_at: now,
            updated_at: now,
        }
    }

    pub fn is_bundle_marker(&self) -> bool {
        self.method == InstallMethod::BundleMarker
    }

    pub fn is_pre_existing(&self) -> bool {
        self.method == InstallMethod::PreExisting
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|d| d == name)
    }
}

/// Persisted manifest document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version
    pub version: u32,

    /// Timestamp of the last write
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub entries: BTreeMap<String, InstallationRecord>,
}

impl Manifest {
    pub fn new() -> Self {
        Self {
            version: MANIFEST_VERSION,
            updated_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&InstallationRecord> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Insert or replace a record, keeping the original install time on reinstall.
    pub fn upsert(&mut self, mut record: InstallationRecord) {
        if let Some(existing) = self.entries.get(&record.name) {
            record.installed_at = existing.installed_at;
        }
        self.entries.insert(record.name.clone(), record);
    }

    pub fn remove(&mut self, name: &str) -> Option<InstallationRecord> {
        self.entries.remove(name)
    }

    pub fn records(&self) -> impl Iterator<Item = &InstallationRecord> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of every other record that lists `name` as a dependency, sorted.
    pub fn dependents(&self, name: &str) -> Vec<String> {
        self.entries
            .values()
            .filter(|r| r.name != name && r.depends_on(name))
            .map(|r| r.name.clone())
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != MANIFEST_VERSION {
            return Err(GearboxError::config(format!(
                "Unsupported manifest version: {}",
                self.version
            )));
        }
        for (key, record) in &self.entries {
            if key != &record.name {
                return Err(GearboxError::config(format!(
                    "Manifest entry '{}' is keyed as '{}'",
                    record.name, key
                )));
            }
        }
        Ok(())
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}
