//! Sequential execution of a removal plan.

use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::plan::{RemovalAction, RemovalMethod, RemovalPlan};
use super::uninstall::Uninstaller;
use crate::error::Result;
use crate::fs::{path_size, remove_path_if_exists};
use crate::manifest::ManifestStore;

const SNAPSHOT_SUFFIX: &str = "pre-uninstall";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    pub dry_run: bool,
    /// Snapshot the manifest before the first action runs.
    pub backup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRemoval {
    pub target: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalResult {
    pub removed: Vec<String>,
    pub failed: Vec<FailedRemoval>,
    /// Bytes deleted from disk. Always zero for a dry run.
    pub space_freed: u64,
    pub dry_run: bool,
    pub backup_path: Option<PathBuf>,
}

impl RemovalResult {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_names(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.target.clone()).collect()
    }
}

pub struct RemovalExecutor<'a> {
    manifest: &'a ManifestStore,
    uninstaller: &'a dyn Uninstaller,
}

impl<'a> RemovalExecutor<'a> {
    pub fn new(manifest: &'a ManifestStore, uninstaller: &'a dyn Uninstaller) -> Self {
        Self {
            manifest,
            uninstaller,
        }
    }

    /// Run every action in plan order.
    ///
    /// A failing action is recorded and the remaining actions still run. The
    /// returned error is reserved for failures outside any single action,
    /// such as being unable to write the snapshot.
    pub fn execute_plan(
        &self,
        plan: &RemovalPlan,
        options: &ExecuteOptions,
    ) -> Result<RemovalResult> {
        let mut result = RemovalResult {
            dry_run: options.dry_run,
            ..Default::default()
        };

        if options.backup && !options.dry_run {
            result.backup_path = self.manifest.create_snapshot(Some(SNAPSHOT_SUFFIX))?;
        }

        for action in &plan.to_remove {
            let outcome = if options.dry_run {
                preview(action)
            } else {
                self.apply(action)
            };
            match outcome {
                Ok(freed) => {
                    info!(
                        tool = %action.target,
                        method = %action.method,
                        dry_run = options.dry_run,
                        "Removed"
                    );
                    result.space_freed += freed;
                    result.removed.push(action.target.clone());
                }
                Err(e) => {
                    warn!(tool = %action.target, error = %e, "Removal failed");
                    result.failed.push(FailedRemoval {
                        target: action.target.clone(),
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        Ok(result)
    }

    fn apply(&self, action: &RemovalAction) -> anyhow::Result<u64> {
        reject_pre_existing(action)?;

        if action.method != RemovalMethod::BundleMarker {
            self.uninstaller
                .uninstall(action.method, &action.target)
                .with_context(|| {
                    format!("{} uninstall of '{}' failed", action.method, action.target)
                })?;
        }

        let mut freed = 0;
        let mut leftovers = Vec::new();
        for path in &action.paths {
            let size = path_size(path);
            match remove_path_if_exists(path) {
                Ok(true) => freed += size,
                Ok(false) => {}
                Err(e) => leftovers.push(format!("{e:#}")),
            }
        }

        // A file-only removal stays tracked so a retry can finish the cleanup.
        if leftovers.is_empty() || action.method.uses_package_manager() {
            self.manifest
                .remove(&action.target)
                .with_context(|| format!("Failed to untrack '{}'", action.target))?;
        }
        if !leftovers.is_empty() {
            anyhow::bail!(
                "'{}' left files behind: {}",
                action.target,
                leftovers.join("; ")
            );
        }
        Ok(freed)
    }
}

fn preview(action: &RemovalAction) -> anyhow::Result<u64> {
    reject_pre_existing(action)?;
    for path in &action.paths {
        info!(tool = %action.target, path = %path.display(), "Would delete");
    }
    Ok(0)
}

fn reject_pre_existing(action: &RemovalAction) -> anyhow::Result<()> {
    if action.method == RemovalMethod::PreExisting {
        anyhow::bail!("cannot remove pre-existing tool '{}'", action.target);
    }
    Ok(())
}
