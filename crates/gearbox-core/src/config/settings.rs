//! User settings (`config.toml`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{GearboxError, Result};
use crate::install::MAX_PARALLEL_JOBS;
use crate::types::{BuildProfile, SafetyLevel};

/// Settings read from `<config_dir>/gearbox/config.toml`.
///
/// Every field is optional in the file. Directory overrides left unset fall
/// back to the detected defaults in [`super::GearboxPaths`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GearboxSettings {
    pub default_build_type: BuildProfile,
    /// `0` means detect from CPU count and available memory.
    pub max_parallel_jobs: usize,
    pub safety_level: SafetyLevel,
    pub backup_before_uninstall: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_dir: Option<PathBuf>,
}

impl Default for GearboxSettings {
    fn default() -> Self {
        Self {
            default_build_type: BuildProfile::default(),
            max_parallel_jobs: 0,
            safety_level: SafetyLevel::default(),
            backup_before_uninstall: true,
            install_dir: None,
            build_dir: None,
            scripts_dir: None,
            catalog_dir: None,
        }
    }
}

impl GearboxSettings {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = crate::catalog::parser::parse_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| GearboxError::config(format!("Failed to serialize settings: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_parallel_jobs > MAX_PARALLEL_JOBS {
            return Err(GearboxError::config(format!(
                "max_parallel_jobs must be between 0 and {MAX_PARALLEL_JOBS}, got {}",
                self.max_parallel_jobs
            )));
        }
        let dirs = [
            ("install_dir", &self.install_dir),
            ("build_dir", &self.build_dir),
            ("scripts_dir", &self.scripts_dir),
            ("catalog_dir", &self.catalog_dir),
        ];
        for (field, dir) in dirs {
            if dir.as_ref().is_some_and(|d| d.as_os_str().is_empty()) {
                return Err(GearboxError::config(format!("{field} cannot be empty")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let settings = GearboxSettings::from_toml_str("").unwrap();
        assert_eq!(settings, GearboxSettings::default());
        assert!(settings.backup_before_uninstall);
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let settings = GearboxSettings::from_toml_str(
            r#"
default_build_type = "maximum"
safety_level = "conservative"
scripts_dir = "/opt/gearbox/scripts"
"#,
        )
        .unwrap();
        assert_eq!(settings.default_build_type, BuildProfile::Maximum);
        assert_eq!(settings.safety_level, SafetyLevel::Conservative);
        assert_eq!(
            settings.scripts_dir,
            Some(PathBuf::from("/opt/gearbox/scripts"))
        );
        assert_eq!(settings.max_parallel_jobs, 0);
    }

    #[test]
    fn rejects_out_of_range_jobs() {
        let err = GearboxSettings::from_toml_str("max_parallel_jobs = 64").unwrap_err();
        assert!(err.to_string().contains("max_parallel_jobs"));
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let err = GearboxSettings::from_toml_str("default_build_type = [").unwrap_err();
        assert!(matches!(err, GearboxError::Config { .. }));
    }

    #[test]
    fn serializes_without_unset_dirs() {
        let toml = GearboxSettings::default().to_toml().unwrap();
        assert!(toml.contains("backup_before_uninstall = true"));
        assert!(!toml.contains("install_dir"));
    }
}
