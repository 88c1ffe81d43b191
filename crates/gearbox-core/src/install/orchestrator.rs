//! Install orchestration across tools.
//!
//! Resolves requested tool and bundle names, orders them, and runs each
//! tool's build as an independent blocking job under a bounded worker pool.
//! A failing build never stops its siblings; failures are aggregated into a
//! single error that still carries the full report.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::bundle::BundleResolver;
use crate::catalog::{ConfigCatalog, ToolSpec};
use crate::error::{GearboxError, Result};
use crate::install::action::{BuildAction, BuildOptions};
use crate::install::order::install_order;
use crate::install::parallelism::resolve_parallelism;
use crate::manifest::{InstallDetails, ManifestStore};
use crate::types::BuildProfile;

/// Options for an install run
#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    /// Tool and bundle names, in the order given by the caller
    pub names: Vec<String>,
    pub profile: BuildProfile,
    /// Worker pool size; 0 auto-detects
    pub max_parallel: usize,
    /// Plan only, never run a build
    pub dry_run: bool,
    pub options: BuildOptions,
}

impl InstallRequest {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_profile(mut self, profile: BuildProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_max_parallel(mut self, jobs: usize) -> Self {
        self.max_parallel = jobs;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self.options.dry_run = dry_run;
        self
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = BuildOptions {
            dry_run: self.dry_run,
            ..options
        };
        self
    }
}

/// Where built artifacts land, used for manifest records.
#[derive(Debug, Clone, Default)]
pub struct InstallLayout {
    pub bin_dir: PathBuf,
    pub build_root: PathBuf,
}

impl InstallLayout {
    pub fn new(bin_dir: impl Into<PathBuf>, build_root: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            build_root: build_root.into(),
        }
    }

    fn details_for(&self, tool: &ToolSpec, version: Option<String>) -> InstallDetails {
        let mut details = InstallDetails::new(tool.install_method)
            .with_version(version.unwrap_or_else(|| "unknown".to_string()));
        if !self.bin_dir.as_os_str().is_empty() {
            details = details.with_binary(self.bin_dir.join(&tool.binary_name));
        }
        if !self.build_root.as_os_str().is_empty() {
            details = details.with_build_dir(self.build_root.join(&tool.name));
        }
        details
    }
}

/// One tool in an install plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedInstall {
    pub name: String,
    pub language: String,
    pub flag: String,
    /// Profile whose flag is used; differs from the request on fallback
    pub profile: BuildProfile,
    pub fell_back: bool,
}

/// Resolved, ordered install plan.
#[derive(Debug, Clone, Serialize)]
pub struct InstallPlan {
    pub profile: BuildProfile,
    pub parallelism: usize,
    /// Bundles named in the request, with their expanded tools
    pub bundles: Vec<(String, Vec<String>)>,
    pub tools: Vec<PlannedInstall>,
}

impl InstallPlan {
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Outcome of one tool's build.
#[derive(Debug, Clone, Serialize)]
pub struct InstallResult {
    pub tool: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration: Duration,
    pub output: String,
}

impl InstallResult {
    fn failure(tool: &str, error: String, duration: Duration, output: String) -> Self {
        Self {
            tool: tool.to_string(),
            success: false,
            error: Some(error),
            duration,
            output,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub plan: InstallPlan,
    /// Sorted successes first, then by name
    pub results: Vec<InstallResult>,
    pub dry_run: bool,
}

impl InstallReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &InstallResult> {
        self.results.iter().filter(|r| r.success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &InstallResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn failed_names(&self) -> Vec<String> {
        self.failed().map(|r| r.tool.clone()).collect()
    }

    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }
}

/// Sort results for display: successes first, then by name.
pub fn sort_results(results: &mut [InstallResult]) {
    results.sort_by(|a, b| b.success.cmp(&a.success).then_with(|| a.tool.cmp(&b.tool)));
}

struct InstallJob {
    tool: ToolSpec,
    flag: String,
    options: BuildOptions,
}

pub struct InstallOrchestrator<'a> {
    catalog: &'a ConfigCatalog,
    action: Arc<dyn BuildAction>,
    manifest: Option<Arc<ManifestStore>>,
    layout: InstallLayout,
}

impl std::fmt::Debug for InstallOrchestrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallOrchestrator")
            .field("manifest", &self.manifest)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl<'a> InstallOrchestrator<'a> {
    pub fn new(catalog: &'a ConfigCatalog, action: Arc<dyn BuildAction>) -> Self {
        Self {
            catalog,
            action,
            manifest: None,
            layout: InstallLayout::default(),
        }
    }

    /// Record successful installs in `manifest`.
    pub fn with_manifest(mut self, manifest: Arc<ManifestStore>) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn with_layout(mut self, layout: InstallLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Resolve names into an ordered plan without running anything.
    pub fn plan(&self, request: &InstallRequest) -> Result<InstallPlan> {
        let resolver = BundleResolver::new(self.catalog);
        let names = resolver.expand_mixed(&request.names)?;

        let mut specs = Vec::with_capacity(names.len());
        for name in &names {
            let spec = self
                .catalog
                .find_tool(name)
                .ok_or_else(|| GearboxError::UnknownTool { name: name.clone() })?;
            specs.push(spec);
        }

        let mut bundles = Vec::new();
        for name in &request.names {
            if self.catalog.is_bundle(name) && !bundles.iter().any(|(b, _)| b == name) {
                bundles.push((name.clone(), resolver.expand(name)?));
            }
        }

        let tools = install_order(&specs)
            .into_iter()
            .map(|tool| {
                let resolved = tool.flag_for(request.profile);
                if resolved.fell_back {
                    info!(
                        tool = %tool.name,
                        requested = %request.profile,
                        using = %resolved.profile,
                        "Build type not supported, using tool default"
                    );
                }
                PlannedInstall {
                    name: tool.name.clone(),
                    language: tool.language.clone(),
                    flag: resolved.flag,
                    profile: resolved.profile,
                    fell_back: resolved.fell_back,
                }
            })
            .collect();

        Ok(InstallPlan {
            profile: request.profile,
            parallelism: resolve_parallelism(request.max_parallel, request.profile),
            bundles,
            tools,
        })
    }

    /// Plan and, unless dry-run, execute the install.
    ///
    /// Returns [`GearboxError::InstallFailed`] naming every failed tool when
    /// at least one build failed; the report inside still lists all results.
    pub fn install(&self, request: &InstallRequest) -> Result<InstallReport> {
        let plan = self.plan(request)?;

        if request.dry_run {
            info!(tools = plan.tools.len(), "Dry run: not executing builds");
            return Ok(InstallReport {
                plan,
                results: Vec::new(),
                dry_run: true,
            });
        }

        let mut results = self.execute(&plan, &request.options)?;
        sort_results(&mut results);

        let report = InstallReport {
            plan,
            results,
            dry_run: false,
        };
        self.track_bundles(&report);

        let failed = report.failed_names();
        info!(
            succeeded = report.results.len() - failed.len(),
            failed = failed.len(),
            "Install run finished"
        );
        if failed.is_empty() {
            Ok(report)
        } else {
            Err(GearboxError::InstallFailed {
                failed,
                report: Box::new(report),
            })
        }
    }

    fn execute(&self, plan: &InstallPlan, options: &BuildOptions) -> Result<Vec<InstallResult>> {
        let jobs: Vec<InstallJob> = plan
            .tools
            .iter()
            .filter_map(|planned| {
                self.catalog.find_tool(&planned.name).map(|tool| InstallJob {
                    tool: tool.clone(),
                    flag: planned.flag.clone(),
                    options: *options,
                })
            })
            .collect();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| GearboxError::Runtime {
                message: format!("Failed to create tokio runtime: {e}"),
            })?;

        let parallelism = plan.parallelism.max(1);
        info!(jobs = jobs.len(), parallelism, "Starting install jobs");
        runtime.block_on(self.run_jobs(jobs, parallelism))
    }

    async fn run_jobs(&self, jobs: Vec<InstallJob>, parallelism: usize) -> Result<Vec<InstallResult>> {
        let semaphore = Arc::new(Semaphore::new(parallelism));
        let results = Arc::new(Mutex::new(Vec::with_capacity(jobs.len())));
        let mut handles = Vec::with_capacity(jobs.len());

        // Permits are taken before spawning so submission follows install order.
        for job in jobs {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| GearboxError::Runtime {
                    message: format!("Worker pool closed: {e}"),
                })?;
            let name = job.tool.name.clone();
            let action = Arc::clone(&self.action);
            let manifest = self.manifest.clone();
            let layout = self.layout.clone();
            let results = Arc::clone(&results);

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let result = run_job(action.as_ref(), manifest.as_deref(), &layout, job);
                results
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(result);
            });
            handles.push((name, handle));
        }

        for (name, handle) in handles {
            if let Err(e) = handle.await {
                warn!(tool = %name, error = %e, "Install job aborted");
                results
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(InstallResult::failure(
                        &name,
                        format!("Install job aborted: {e}"),
                        Duration::ZERO,
                        String::new(),
                    ));
            }
        }

        let mut guard = results.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(std::mem::take(&mut *guard))
    }

    /// Record a marker for every requested bundle whose tools all succeeded.
    fn track_bundles(&self, report: &InstallReport) {
        let Some(manifest) = &self.manifest else {
            return;
        };
        for (bundle, expanded) in &report.plan.bundles {
            let all_ok = expanded.iter().all(|tool| {
                report
                    .results
                    .iter()
                    .any(|r| r.success && &r.tool == tool)
            });
            if !all_ok {
                debug!(bundle = %bundle, "Skipping bundle marker, not every tool installed");
                continue;
            }
            let direct = self
                .catalog
                .find_bundle(bundle)
                .map(|b| b.tools.clone())
                .unwrap_or_default();
            if let Err(e) = manifest.track_bundle(bundle, &direct, expanded) {
                warn!(bundle = %bundle, error = %e, "Failed to record bundle marker");
            }
        }
    }
}

fn run_job(
    action: &dyn BuildAction,
    manifest: Option<&ManifestStore>,
    layout: &InstallLayout,
    job: InstallJob,
) -> InstallResult {
    let started = Instant::now();
    debug!(tool = %job.tool.name, flag = %job.flag, "Building");

    let outcome = action.execute(&job.tool, &job.flag, &job.options);
    let duration = started.elapsed();

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(tool = %job.tool.name, error = %e, "Build failed");
            return InstallResult::failure(&job.tool.name, format!("{e:#}"), duration, String::new());
        }
    };

    if !outcome.success {
        warn!(tool = %job.tool.name, "Build reported failure");
        return InstallResult::failure(
            &job.tool.name,
            "Build exited unsuccessfully".to_string(),
            duration,
            outcome.output,
        );
    }

    if let Some(manifest) = manifest {
        let details = layout.details_for(&job.tool, outcome.version);
        if let Err(e) = manifest.track_installation(&job.tool, details) {
            return InstallResult::failure(
                &job.tool.name,
                format!("Installed but not recorded in manifest: {e}"),
                duration,
                outcome.output,
            );
        }
    }

    info!(tool = %job.tool.name, elapsed = ?duration, "Installed");
    InstallResult {
        tool: job.tool.name,
        success: true,
        error: None,
        duration,
        output: outcome.output,
    }
}
