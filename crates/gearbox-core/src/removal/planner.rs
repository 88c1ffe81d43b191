//! Removal planning.
//!
//! Classifies each requested target as removable, kept, or untracked, then
//! decides what happens to the dependencies of everything being removed.
//! The manifest is the only source consulted for "is this tracked"; the
//! filesystem is never inspected here.

use std::collections::HashSet;

use tracing::debug;

use super::plan::{
    DependencyAction, DependencyDecision, KeepEntry, PlanWarning, RemovalAction, RemovalMethod,
    RemovalOptions, RemovalPlan, WarningLevel,
};
use crate::bundle::{BundleResolver, dedup_preserving_order};
use crate::catalog::ConfigCatalog;
use crate::error::Result;
use crate::manifest::{InstallationRecord, Manifest, ManifestStore};

const PRE_EXISTING_REASON: &str = "pre-existing - not gearbox-managed";

#[derive(Debug, Clone, Copy)]
pub struct RemovalPlanner<'a> {
    manifest: &'a ManifestStore,
    catalog: Option<&'a ConfigCatalog>,
}

impl<'a> RemovalPlanner<'a> {
    pub fn new(manifest: &'a ManifestStore) -> Self {
        Self {
            manifest,
            catalog: None,
        }
    }

    /// Use the catalog to expand bundle markers recorded without contents.
    pub fn with_catalog(mut self, catalog: &'a ConfigCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn plan_removal<S: AsRef<str>>(
        &self,
        targets: &[S],
        options: &RemovalOptions,
    ) -> Result<RemovalPlan> {
        let manifest = self.manifest.load()?;
        let targets = dedup_preserving_order(targets.iter().map(|t| t.as_ref().to_string()));

        let mut plan = RemovalPlan::default();
        let mut candidates = Vec::new();
        let mut seen_markers = HashSet::new();
        for target in &targets {
            self.collect_target(
                &manifest,
                target,
                options,
                &mut plan,
                &mut candidates,
                &mut seen_markers,
            )?;
        }
        let candidates = dedup_preserving_order(candidates);

        let removing = settle_removal_set(&manifest, &candidates, options.force);
        for name in &candidates {
            let Some(record) = manifest.get(name) else {
                continue;
            };
            let live = live_dependents(&manifest, name, &removing);

            if !removing.contains(name) {
                let mut reasons = Vec::new();
                if record.is_pre_existing() {
                    reasons.push(PRE_EXISTING_REASON.to_string());
                }
                if !live.is_empty() {
                    reasons.push(format!("required by: {}", live.join(", ")));
                }
                debug!(tool = %name, ?reasons, "Keeping target");
                plan.to_keep.push(KeepEntry {
                    target: name.clone(),
                    reasons,
                });
                continue;
            }

            let mut forced = Vec::new();
            if record.is_pre_existing() {
                forced.push("pre-existing tool".to_string());
            }
            if !live.is_empty() {
                forced.push(format!("required by {}", live.join(", ")));
            }

            let mut action = build_action(record, options)?;
            if !forced.is_empty() {
                action.is_safe = false;
                action.reason = format!("forced: {}", forced.join("; "));
                plan.warnings.push(PlanWarning::new(
                    name,
                    WarningLevel::Critical,
                    format!("Forcing removal of '{name}' ({})", forced.join("; ")),
                ));
            }
            plan.to_remove.push(action);
        }

        analyze_dependencies(&manifest, options, &mut plan)?;
        plan.refresh_summary();
        debug!(
            remove = plan.summary.will_remove,
            keep = plan.summary.will_keep,
            "Planned removal"
        );
        Ok(plan)
    }

    fn collect_target(
        &self,
        manifest: &Manifest,
        target: &str,
        options: &RemovalOptions,
        plan: &mut RemovalPlan,
        candidates: &mut Vec<String>,
        seen_markers: &mut HashSet<String>,
    ) -> Result<()> {
        let Some(record) = manifest.get(target) else {
            plan.warnings.push(PlanWarning::new(
                target,
                WarningLevel::Warning,
                format!("'{target}' is not tracked by gearbox; skipping"),
            ));
            return Ok(());
        };

        if !record.is_bundle_marker() {
            candidates.push(target.to_string());
            return Ok(());
        }

        if !seen_markers.insert(target.to_string()) {
            return Ok(());
        }
        plan.to_remove.push(build_action(record, options)?);

        let members = self.bundle_members(record)?;
        if options.remove_bundle_contents {
            for member in &members {
                self.collect_target(manifest, member, options, plan, candidates, seen_markers)?;
            }
        } else if !members.is_empty() {
            plan.warnings.push(PlanWarning::new(
                target,
                WarningLevel::Info,
                format!(
                    "Bundle '{target}' marker removed; its tools remain installed: {}",
                    members.join(", ")
                ),
            ));
        }
        Ok(())
    }

    fn bundle_members(&self, record: &InstallationRecord) -> Result<Vec<String>> {
        let recorded = record
            .bundle
            .as_ref()
            .map(|b| b.members().to_vec())
            .unwrap_or_default();
        if !recorded.is_empty() {
            return Ok(recorded);
        }
        match self.catalog {
            Some(catalog) if catalog.is_bundle(&record.name) => {
                BundleResolver::new(catalog).expand(&record.name)
            }
            _ => Ok(Vec::new()),
        }
    }
}

/// Shrink the candidate set until every remaining candidate is removable.
///
/// Keeping a tool keeps its own dependencies alive, so classification runs
/// to a fixed point. With `force` nothing is dropped.
fn settle_removal_set(manifest: &Manifest, candidates: &[String], force: bool) -> HashSet<String> {
    let mut removing: HashSet<String> = candidates.iter().cloned().collect();
    if force {
        return removing;
    }
    loop {
        let blocked: Vec<String> = candidates
            .iter()
            .filter(|name| removing.contains(*name))
            .filter(|name| {
                manifest.get(name).is_some_and(InstallationRecord::is_pre_existing)
                    || !live_dependents(manifest, name, &removing).is_empty()
            })
            .cloned()
            .collect();
        if blocked.is_empty() {
            return removing;
        }
        for name in blocked {
            removing.remove(&name);
        }
    }
}

/// Dependents of `name` that are not themselves being removed.
fn live_dependents(manifest: &Manifest, name: &str, removing: &HashSet<String>) -> Vec<String> {
    manifest
        .dependents(name)
        .into_iter()
        .filter(|d| !removing.contains(d))
        .collect()
}

fn build_action(record: &InstallationRecord, options: &RemovalOptions) -> Result<RemovalAction> {
    let method = RemovalMethod::for_record(record)?;
    let mut paths = Vec::new();
    if method != RemovalMethod::BundleMarker {
        paths.extend(record.binary_paths.iter().cloned());
        if let Some(dir) = &record.build_dir {
            paths.push(dir.clone());
        }
        if options.remove_config {
            paths.extend(record.config_paths.iter().cloned());
        }
    }
    Ok(RemovalAction {
        target: record.name.clone(),
        method,
        paths,
        is_safe: true,
        reason: format!("tracked as {}", record.method),
    })
}

/// Dependencies referenced by the named records, first seen first, skipping `exclude`.
fn referenced_dependencies(
    manifest: &Manifest,
    names: &[String],
    exclude: &HashSet<String>,
) -> Vec<String> {
    let deps = names
        .iter()
        .filter_map(|name| manifest.get(name))
        .flat_map(|record| record.dependencies.iter().cloned())
        .filter(|dep| !exclude.contains(dep));
    dedup_preserving_order(deps)
}

fn analyze_dependencies(
    manifest: &Manifest,
    options: &RemovalOptions,
    plan: &mut RemovalPlan,
) -> Result<()> {
    let direct: HashSet<String> = plan.to_remove.iter().map(|a| a.target.clone()).collect();
    let mut removal: Vec<String> = plan.to_remove.iter().map(|a| a.target.clone()).collect();
    let mut removal_set = direct.clone();
    let mut cascaded = Vec::new();

    if options.cascade {
        loop {
            let mut added = false;
            for dep in referenced_dependencies(manifest, &removal, &removal_set) {
                let protected = manifest
                    .get(&dep)
                    .is_some_and(|r| r.is_pre_existing() || r.is_bundle_marker());
                if protected {
                    continue;
                }
                if manifest
                    .dependents(&dep)
                    .iter()
                    .all(|d| removal_set.contains(d))
                {
                    removal_set.insert(dep.clone());
                    removal.push(dep.clone());
                    cascaded.push(dep);
                    added = true;
                }
            }
            if !added {
                break;
            }
        }
    }

    for dep in referenced_dependencies(manifest, &removal, &direct) {
        let dependents = manifest.dependents(&dep);
        if cascaded.contains(&dep) {
            let reason = format!(
                "cascade: last dependents removed ({})",
                dependents.join(", ")
            );
            if let Some(record) = manifest.get(&dep) {
                let mut action = build_action(record, options)?;
                action.reason = reason.clone();
                plan.to_remove.push(action);
            }
            plan.dependencies.push(DependencyAction {
                dependency: dep,
                action: DependencyDecision::CascadeDelete,
                affected: dependents,
                reason,
            });
            continue;
        }

        let remaining: Vec<String> = dependents
            .into_iter()
            .filter(|d| !removal_set.contains(d))
            .collect();
        let reason = if !remaining.is_empty() {
            format!("still required by: {}", remaining.join(", "))
        } else if manifest.get(&dep).is_some_and(InstallationRecord::is_pre_existing) {
            PRE_EXISTING_REASON.to_string()
        } else if options.cascade {
            "not removable by cascade".to_string()
        } else {
            "no remaining dependents; use --cascade to remove it".to_string()
        };
        plan.dependencies.push(DependencyAction {
            dependency: dep,
            action: DependencyDecision::Preserve,
            affected: remaining,
            reason,
        });
    }
    Ok(())
}
