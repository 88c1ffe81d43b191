//! Removal plan types.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{GearboxError, Result};
use crate::install::normalize_language;
use crate::manifest::{InstallMethod, InstallationRecord};

/// Concrete uninstall strategy for a tracked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemovalMethod {
    Cargo,
    Go,
    Pipx,
    Npm,
    SystemPackage,
    /// Delete the recorded files and directories.
    Filesystem,
    BundleMarker,
    /// Never executed; kept so plans can describe forced targets.
    PreExisting,
}

impl RemovalMethod {
    /// Derive the strategy from a manifest record.
    ///
    /// Language package manager installs need a language gearbox knows how
    /// to uninstall; anything else is an error rather than a silent no-op.
    pub fn for_record(record: &InstallationRecord) -> Result<Self> {
        match record.method {
            InstallMethod::SourceBuild => Ok(Self::Filesystem),
            InstallMethod::SystemPackage => Ok(Self::SystemPackage),
            InstallMethod::PreExisting => Ok(Self::PreExisting),
            InstallMethod::BundleMarker => Ok(Self::BundleMarker),
            InstallMethod::LanguagePackageManager => {
                let language = record.language.as_deref().unwrap_or_default();
                match normalize_language(language).as_str() {
                    "rust" => Ok(Self::Cargo),
                    "go" => Ok(Self::Go),
                    "python" => Ok(Self::Pipx),
                    "nodejs" => Ok(Self::Npm),
                    "" => Err(GearboxError::UnsupportedRemoval {
                        target: record.name.clone(),
                        reason: "no language recorded for a package manager install".into(),
                    }),
                    other => Err(GearboxError::UnsupportedRemoval {
                        target: record.name.clone(),
                        reason: format!("no package manager known for language '{other}'"),
                    }),
                }
            }
        }
    }

    /// Whether removal runs an external package manager command.
    ///
    /// Once such a command succeeds the package is gone, so the record must
    /// not be left behind for a retry that can only fail.
    pub fn uses_package_manager(&self) -> bool {
        matches!(
            self,
            Self::Cargo | Self::Pipx | Self::Npm | Self::SystemPackage
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cargo => "cargo",
            Self::Go => "go",
            Self::Pipx => "pipx",
            Self::Npm => "npm",
            Self::SystemPackage => "system-package",
            Self::Filesystem => "filesystem",
            Self::BundleMarker => "bundle-marker",
            Self::PreExisting => "pre-existing",
        }
    }
}

impl fmt::Display for RemovalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flags controlling removal planning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalOptions {
    /// Remove despite dependents or pre-existing status; actions become unsafe.
    pub force: bool,
    /// Also remove dependencies left with no dependents.
    pub cascade: bool,
    /// Include recorded config files in the deleted paths.
    pub remove_config: bool,
    /// Removing a bundle marker also removes its member tools.
    pub remove_bundle_contents: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalAction {
    pub target: String,
    pub method: RemovalMethod,
    pub paths: Vec<PathBuf>,
    pub is_safe: bool,
    pub reason: String,
}

/// A requested target that will not be removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepEntry {
    pub target: String,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyDecision {
    Preserve,
    CascadeDelete,
}

impl fmt::Display for DependencyDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preserve => f.write_str("preserve"),
            Self::CascadeDelete => f.write_str("cascade-delete"),
        }
    }
}

/// Decision for a dependency referenced by a removed tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyAction {
    pub dependency: String,
    pub action: DependencyDecision,
    /// Preserve: dependents left after the removal.
    /// Cascade: the dependents being removed alongside it.
    pub affected: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Warning => f.write_str("warning"),
            Self::Critical => f.write_str("critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanWarning {
    pub target: String,
    pub level: WarningLevel,
    pub message: String,
}

impl PlanWarning {
    pub fn new(target: impl Into<String>, level: WarningLevel, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalSummary {
    pub will_remove: usize,
    pub will_keep: usize,
    pub unsafe_removals: usize,
    pub dependencies_preserved: usize,
    pub dependencies_cascaded: usize,
    pub warnings: usize,
    pub by_method: BTreeMap<RemovalMethod, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalPlan {
    pub to_remove: Vec<RemovalAction>,
    pub to_keep: Vec<KeepEntry>,
    pub dependencies: Vec<DependencyAction>,
    pub warnings: Vec<PlanWarning>,
    pub summary: RemovalSummary,
}

impl RemovalPlan {
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty()
    }

    pub fn will_remove(&self, target: &str) -> bool {
        self.to_remove.iter().any(|a| a.target == target)
    }

    pub fn action(&self, target: &str) -> Option<&RemovalAction> {
        self.to_remove.iter().find(|a| a.target == target)
    }

    pub fn dependency(&self, name: &str) -> Option<&DependencyAction> {
        self.dependencies.iter().find(|d| d.dependency == name)
    }

    /// Recompute the summary from the plan's current contents.
    pub fn refresh_summary(&mut self) {
        let mut by_method = BTreeMap::new();
        for action in &self.to_remove {
            *by_method.entry(action.method).or_insert(0) += 1;
        }
        let cascaded = self
            .dependencies
            .iter()
            .filter(|d| d.action == DependencyDecision::CascadeDelete)
            .count();
        self.summary = RemovalSummary {
            will_remove: self.to_remove.len(),
            will_keep: self.to_keep.len(),
            unsafe_removals: self.to_remove.iter().filter(|a| !a.is_safe).count(),
            dependencies_preserved: self.dependencies.len() - cascaded,
            dependencies_cascaded: cascaded,
            warnings: self.warnings.len(),
            by_method,
        };
    }
}
