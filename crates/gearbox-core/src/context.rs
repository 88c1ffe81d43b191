//! Application context for unified dependency injection.
//!
//! The builder runs one step per concern so each can be exercised on its
//! own: path detection, settings load, catalog load, parallelism, and
//! package-manager detection. `build()` runs whichever steps were skipped.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::ConfigCatalog;
use crate::config::{GearboxPaths, GearboxSettings, SettingsStore};
use crate::error::Result;
use crate::install::{
    BuildAction, InstallLayout, InstallOrchestrator, InstallRequest, ScriptBuildAction,
    resolve_parallelism,
};
use crate::manifest::ManifestStore;
use crate::removal::{
    CommandUninstaller, RemovalExecutor, RemovalPlanner, SystemPackageManager, Uninstaller,
};

/// Everything a frontend needs, resolved once.
///
/// Immutable after construction; frontends create it once and hand out
/// references to the components it builds.
#[derive(Debug, Clone)]
pub struct GearboxContext {
    paths: GearboxPaths,
    settings: GearboxSettings,
    catalog: Arc<ConfigCatalog>,
    manifest: Arc<ManifestStore>,
    /// Job count as requested; `0` means detect per build profile.
    max_parallel_jobs: usize,
    parallelism: usize,
    package_manager: Option<SystemPackageManager>,
}

impl GearboxContext {
    pub fn builder() -> GearboxContextBuilder {
        GearboxContextBuilder::new()
    }

    pub fn paths(&self) -> &GearboxPaths {
        &self.paths
    }

    pub fn settings(&self) -> &GearboxSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &ConfigCatalog {
        &self.catalog
    }

    pub fn manifest(&self) -> &ManifestStore {
        &self.manifest
    }

    /// Job count resolved for the default build type, for display.
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn max_parallel_jobs(&self) -> usize {
        self.max_parallel_jobs
    }

    pub fn package_manager(&self) -> Option<SystemPackageManager> {
        self.package_manager
    }

    pub fn install_layout(&self) -> InstallLayout {
        InstallLayout::new(&self.paths.install_dir, &self.paths.build_dir)
    }

    /// Orchestrator driving the install scripts under `scripts_dir`.
    pub fn install_orchestrator(&self) -> InstallOrchestrator<'_> {
        let action: Arc<dyn BuildAction> =
            Arc::new(ScriptBuildAction::new(&self.paths.scripts_dir));
        self.install_orchestrator_with(action)
    }

    pub fn install_orchestrator_with(
        &self,
        action: Arc<dyn BuildAction>,
    ) -> InstallOrchestrator<'_> {
        InstallOrchestrator::new(&self.catalog, action)
            .with_manifest(Arc::clone(&self.manifest))
            .with_layout(self.install_layout())
    }

    /// Request pre-filled with the configured build type and job count.
    ///
    /// The job count is passed through unresolved so the orchestrator sizes
    /// the pool for whichever profile the request ends up with.
    pub fn install_request<S: AsRef<str>>(&self, names: &[S]) -> InstallRequest {
        InstallRequest::new(names.iter().map(|n| n.as_ref().to_string()))
            .with_profile(self.settings.default_build_type)
            .with_max_parallel(self.max_parallel_jobs)
    }

    pub fn removal_planner(&self) -> RemovalPlanner<'_> {
        RemovalPlanner::new(&self.manifest).with_catalog(&self.catalog)
    }

    pub fn uninstaller(&self) -> CommandUninstaller {
        CommandUninstaller::new(self.package_manager)
    }

    pub fn removal_executor<'a>(
        &'a self,
        uninstaller: &'a dyn Uninstaller,
    ) -> RemovalExecutor<'a> {
        RemovalExecutor::new(&self.manifest, uninstaller)
    }
}

#[derive(Debug, Default)]
pub struct GearboxContextBuilder {
    paths: Option<GearboxPaths>,
    settings: Option<GearboxSettings>,
    catalog: Option<ConfigCatalog>,
    jobs: Option<usize>,
    parallelism: Option<usize>,
    package_manager: Option<Option<SystemPackageManager>>,
}

impl GearboxContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paths(mut self, paths: GearboxPaths) -> Self {
        self.paths = Some(paths);
        self
    }

    /// Use every directory under `root` instead of the per-user ones.
    pub fn with_root(self, root: &Path) -> Self {
        self.with_paths(GearboxPaths::under(root))
    }

    pub fn with_settings(mut self, settings: GearboxSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_catalog(mut self, catalog: ConfigCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Explicit job count, taking precedence over the settings file.
    pub fn with_parallelism(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn with_package_manager(mut self, package_manager: Option<SystemPackageManager>) -> Self {
        self.package_manager = Some(package_manager);
        self
    }

    /// Step 1: per-user directories.
    pub fn detect_paths(mut self) -> Result<Self> {
        if self.paths.is_none() {
            self.paths = Some(GearboxPaths::detect()?);
        }
        Ok(self)
    }

    /// Step 2: `config.toml`, defaults when absent.
    pub fn load_settings(mut self) -> Result<Self> {
        if self.settings.is_none() {
            let paths = self.base_paths()?;
            let settings = SettingsStore::new(paths.settings_file()).load()?;
            self.settings = Some(settings);
        }
        Ok(self)
    }

    /// Step 3: tool and bundle catalogs from the catalog directory.
    pub fn load_catalog(mut self) -> Result<Self> {
        if self.catalog.is_none() {
            let paths = self.resolved_paths()?;
            let tools = paths.tools_file();
            let bundles = paths.bundles_file();
            debug!(tools = %tools.display(), bundles = %bundles.display(), "Loading catalog");
            self.catalog = Some(ConfigCatalog::load(&tools, Some(&bundles))?);
        }
        Ok(self)
    }

    /// Step 4: worker pool size for the default build type.
    pub fn calculate_parallelism(mut self) -> Self {
        if self.parallelism.is_none() {
            let profile = self
                .settings
                .as_ref()
                .map(|s| s.default_build_type)
                .unwrap_or_default();
            self.parallelism = Some(resolve_parallelism(self.requested_jobs(), profile));
        }
        self
    }

    /// Step 5: system package manager on `PATH`.
    pub fn detect_package_manager(mut self) -> Self {
        if self.package_manager.is_none() {
            let detected = SystemPackageManager::detect();
            debug!(package_manager = ?detected, "Detected system package manager");
            self.package_manager = Some(detected);
        }
        self
    }

    pub fn build(self) -> Result<GearboxContext> {
        let builder = self
            .detect_paths()?
            .load_settings()?
            .load_catalog()?
            .calculate_parallelism()
            .detect_package_manager();

        let paths = builder.resolved_paths()?;
        let max_parallel_jobs = builder.requested_jobs();
        let Self {
            settings,
            catalog,
            parallelism,
            package_manager,
            ..
        } = builder;
        let settings = settings.unwrap_or_default();
        let catalog = catalog.unwrap_or_default();
        let parallelism = parallelism.unwrap_or(1);
        let package_manager = package_manager.flatten();

        let manifest = Arc::new(ManifestStore::new(paths.manifest_file()));
        info!(
            tools = catalog.all_tools().len(),
            bundles = catalog.all_bundles().len(),
            parallelism,
            manifest = %manifest.path().display(),
            "Context ready"
        );

        Ok(GearboxContext {
            paths,
            settings,
            catalog: Arc::new(catalog),
            manifest,
            max_parallel_jobs,
            parallelism,
            package_manager,
        })
    }

    /// Explicit job count, else the settings value; `0` means auto.
    fn requested_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            self.settings
                .as_ref()
                .map(|s| s.max_parallel_jobs)
                .unwrap_or(0)
        })
    }

    fn base_paths(&self) -> Result<GearboxPaths> {
        match &self.paths {
            Some(paths) => Ok(paths.clone()),
            None => GearboxPaths::detect(),
        }
    }

    /// Detected paths with the settings' directory overrides applied.
    fn resolved_paths(&self) -> Result<GearboxPaths> {
        let mut paths = self.base_paths()?;
        if let Some(settings) = &self.settings {
            paths.apply_settings(settings);
        }
        Ok(paths)
    }
}
