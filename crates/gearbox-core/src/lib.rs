//! Gearbox Core Library
//!
//! Orchestration core for building and removing developer tools: the tool
//! and bundle catalog, bundle expansion, the installation manifest,
//! bounded-parallel installs, and dependency-aware removal planning.

pub mod bundle;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod fs;
pub mod install;
pub mod manifest;
pub mod removal;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Catalog
    pub use crate::catalog::{BundleSpec, ConfigCatalog, SharedCatalog, ToolSpec};

    // Bundles
    pub use crate::bundle::BundleResolver;

    // Configuration
    pub use crate::config::{GearboxPaths, GearboxSettings, SettingsStore};
    pub use crate::context::{GearboxContext, GearboxContextBuilder};

    // Errors
    pub use crate::error::{GearboxError, Result};

    // Install
    pub use crate::install::{
        BuildAction, BuildOptions, BuildOutcome, InstallOrchestrator, InstallPlan, InstallReport,
        InstallRequest, InstallResult, ScriptBuildAction,
    };

    // Manifest
    pub use crate::manifest::{InstallMethod, InstallationRecord, Manifest, ManifestStore};

    // Removal
    pub use crate::removal::{
        CommandUninstaller, ExecuteOptions, RemovalExecutor, RemovalOptions, RemovalPlan,
        RemovalPlanner, RemovalResult, Uninstaller, validate_plan,
    };

    // Shared enums
    pub use crate::types::{BuildProfile, SafetyLevel};
}
