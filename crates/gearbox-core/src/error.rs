//! Error types for the orchestration core.
//!
//! Catalog, resolution, manifest and planning failures are typed so callers
//! can tell a bad request apart from a broken store. External collaborators
//! (build scripts, uninstall commands) report through `anyhow` instead.

use std::path::PathBuf;

use crate::install::InstallReport;

pub type Result<T> = std::result::Result<T, GearboxError>;

#[derive(Debug, thiserror::Error)]
pub enum GearboxError {
    /// Malformed catalog or settings, or a bundle referencing something undefined.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A bundle includes itself, directly or transitively.
    ///
    /// `chain` starts at the requested root and ends with the repeated name.
    #[error("Circular bundle dependency detected while expanding '{}': {}", .chain.first().map(String::as_str).unwrap_or_default(), .chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    #[error("Unknown tool '{name}'")]
    UnknownTool { name: String },

    #[error("Unknown bundle '{name}'")]
    UnknownBundle { name: String },

    /// The persisted manifest exists but cannot be read or parsed.
    #[error("Manifest error at {}: {message}", .path.display())]
    Manifest { path: PathBuf, message: String },

    /// One or more tools failed to install. The full report is kept so
    /// callers can still render the successful half of the run.
    #[error("Installation failed for: {}", .failed.join(", "))]
    InstallFailed {
        failed: Vec<String>,
        report: Box<InstallReport>,
    },

    #[error("Cannot determine how to remove '{target}': {reason}")]
    UnsupportedRemoval { target: String, reason: String },

    #[error("Task scheduling error: {message}")]
    Runtime { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GearboxError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn manifest(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Names of the tools that failed, when this is an aggregate install error.
    pub fn failed_tools(&self) -> &[String] {
        match self {
            Self::InstallFailed { failed, .. } => failed,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_dependency_names_root_and_chain() {
        let err = GearboxError::CircularDependency {
            chain: vec!["dev".into(), "core".into(), "dev".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("expanding 'dev'"));
        assert!(msg.contains("dev -> core -> dev"));
    }

    #[test]
    fn failed_tools_empty_for_other_variants() {
        let err = GearboxError::UnknownTool {
            name: "nope".into(),
        };
        assert!(err.failed_tools().is_empty());
        assert_eq!(err.to_string(), "Unknown tool 'nope'");
    }
}
