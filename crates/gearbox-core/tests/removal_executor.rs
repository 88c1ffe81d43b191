//! Executing removal plans against a temporary install tree.

mod support;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use gearbox_core::manifest::{InstallMethod, InstallationRecord, Manifest, ManifestStore};
use gearbox_core::removal::{
    ExecuteOptions, RemovalExecutor, RemovalMethod, RemovalOptions, RemovalPlan, RemovalPlanner,
    RemovalResult, Uninstaller,
};
use tempfile::TempDir;

use support::{pre_existing, seed, temp_store, tool, with_method, with_paths};

#[derive(Default)]
struct RecordingUninstaller {
    fail: HashSet<String>,
    calls: Mutex<Vec<(RemovalMethod, String)>>,
}

impl RecordingUninstaller {
    fn failing(names: &[&str]) -> Self {
        Self {
            fail: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<(RemovalMethod, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Uninstaller for RecordingUninstaller {
    fn uninstall(&self, method: RemovalMethod, target: &str) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push((method, target.to_string()));
        if self.fail.contains(target) {
            anyhow::bail!("exit status 1");
        }
        Ok(())
    }
}

/// Store with ripgrep and fd built into `root`, each with a binary and a build dir.
fn installed_tree() -> (TempDir, ManifestStore) {
    let (temp, store) = temp_store();
    let root = temp.path();
    let mut records = Vec::new();
    for (name, binary, size) in [("ripgrep", "rg", 100), ("fd", "fd", 50)] {
        let bin = root.join("bin").join(binary);
        let build = root.join("build").join(name);
        write_bytes(&bin, 10);
        write_bytes(&build.join("target").join("out.o"), size);
        records.push(with_paths(tool(name, "rust", &[]), bin, Some(build)));
    }
    seed(&store, records);
    (temp, store)
}

fn write_bytes(path: &Path, len: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![0u8; len]).unwrap();
}

fn plan_for(store: &ManifestStore, targets: &[&str], options: RemovalOptions) -> RemovalPlan {
    RemovalPlanner::new(store)
        .plan_removal(targets, &options)
        .unwrap()
}

fn run(store: &ManifestStore, plan: &RemovalPlan, options: ExecuteOptions) -> RemovalResult {
    let uninstaller = RecordingUninstaller::default();
    RemovalExecutor::new(store, &uninstaller)
        .execute_plan(plan, &options)
        .unwrap()
}

#[test]
fn removes_files_and_untracks() {
    let (temp, store) = installed_tree();
    let plan = plan_for(&store, &["ripgrep", "fd"], RemovalOptions::default());

    let result = run(&store, &plan, ExecuteOptions::default());

    assert!(result.is_success());
    assert_eq!(result.removed, vec!["ripgrep", "fd"]);
    assert_eq!(result.space_freed, 10 + 100 + 10 + 50);
    assert!(!temp.path().join("bin/rg").exists());
    assert!(!temp.path().join("build/fd").exists());
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn source_builds_still_go_through_the_uninstaller() {
    let (_temp, store) = installed_tree();
    let plan = plan_for(&store, &["fd"], RemovalOptions::default());
    let uninstaller = RecordingUninstaller::default();

    RemovalExecutor::new(&store, &uninstaller)
        .execute_plan(&plan, &ExecuteOptions::default())
        .unwrap();

    assert_eq!(
        uninstaller.calls(),
        vec![(RemovalMethod::Filesystem, "fd".to_string())]
    );
}

#[test]
fn dry_run_touches_nothing_and_reports_the_same_outcome() {
    let (temp, store) = installed_tree();
    seed_extra(&store, pre_existing("git"));
    let plan = plan_for(
        &store,
        &["ripgrep", "git"],
        RemovalOptions {
            force: true,
            ..Default::default()
        },
    );
    let before = fs::read(store.path()).unwrap();

    let preview = run(
        &store,
        &plan,
        ExecuteOptions {
            dry_run: true,
            backup: true,
        },
    );

    assert!(preview.dry_run);
    assert_eq!(preview.space_freed, 0);
    assert!(preview.backup_path.is_none());
    assert!(temp.path().join("bin/rg").exists());
    assert_eq!(fs::read(store.path()).unwrap(), before);

    let real = run(&store, &plan, ExecuteOptions::default());
    assert_eq!(preview.removed, real.removed);
    assert_eq!(preview.failed_names(), real.failed_names());
}

#[test]
fn pre_existing_action_fails_without_side_effects() {
    let (_temp, store) = temp_store();
    seed(&store, vec![pre_existing("git")]);
    let plan = plan_for(
        &store,
        &["git"],
        RemovalOptions {
            force: true,
            ..Default::default()
        },
    );
    let uninstaller = RecordingUninstaller::default();

    let result = RemovalExecutor::new(&store, &uninstaller)
        .execute_plan(&plan, &ExecuteOptions::default())
        .unwrap();

    assert!(result.removed.is_empty());
    assert_eq!(result.failed_names(), vec!["git"]);
    assert!(result.failed[0].error.contains("pre-existing"));
    assert!(uninstaller.calls().is_empty());
    assert!(store.is_tracked("git").unwrap());
}

#[test]
fn failure_does_not_stop_later_actions() {
    let (temp, store) = installed_tree();
    let plan = plan_for(&store, &["ripgrep", "fd"], RemovalOptions::default());
    let uninstaller = RecordingUninstaller::failing(&["ripgrep"]);

    let result = RemovalExecutor::new(&store, &uninstaller)
        .execute_plan(&plan, &ExecuteOptions::default())
        .unwrap();

    assert_eq!(result.removed, vec!["fd"]);
    assert_eq!(result.failed_names(), vec!["ripgrep"]);
    assert!(result.failed[0].error.contains("filesystem uninstall of 'ripgrep' failed"));
    assert!(result.failed[0].error.contains("exit status 1"));
    assert_eq!(result.space_freed, 60);

    // The failed tool keeps its files and its record
    assert!(temp.path().join("bin/rg").exists());
    assert!(store.is_tracked("ripgrep").unwrap());
    assert!(!store.is_tracked("fd").unwrap());
}

#[test]
fn package_manager_tools_use_their_method() {
    let (_temp, store) = temp_store();
    seed(
        &store,
        vec![with_method(
            tool("black", "python", &[]),
            InstallMethod::LanguagePackageManager,
        )],
    );
    let plan = plan_for(&store, &["black"], RemovalOptions::default());
    let uninstaller = RecordingUninstaller::default();

    let result = RemovalExecutor::new(&store, &uninstaller)
        .execute_plan(&plan, &ExecuteOptions::default())
        .unwrap();

    assert!(result.is_success());
    assert_eq!(
        uninstaller.calls(),
        vec![(RemovalMethod::Pipx, "black".to_string())]
    );
}

#[test]
fn bundle_marker_only_untracks() {
    let (_temp, store) = installed_tree();
    store
        .track_bundle("test-bundle", &["fd".to_string(), "ripgrep".to_string()], &[])
        .unwrap();
    let plan = plan_for(&store, &["test-bundle"], RemovalOptions::default());
    let uninstaller = RecordingUninstaller::default();

    let result = RemovalExecutor::new(&store, &uninstaller)
        .execute_plan(&plan, &ExecuteOptions::default())
        .unwrap();

    assert_eq!(result.removed, vec!["test-bundle"]);
    assert!(uninstaller.calls().is_empty());
    assert!(!store.is_tracked("test-bundle").unwrap());
    assert!(store.is_tracked("fd").unwrap());
}

#[test]
fn backup_snapshot_precedes_removal() {
    let (temp, store) = installed_tree();
    let plan = plan_for(&store, &["fd"], RemovalOptions::default());

    let result = run(
        &store,
        &plan,
        ExecuteOptions {
            dry_run: false,
            backup: true,
        },
    );

    let backup = result.backup_path.unwrap();
    assert!(backup.starts_with(temp.path()));
    assert!(
        backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with(".pre-uninstall.json")
    );
    let saved: Manifest =
        serde_json::from_slice(&fs::read(&backup).unwrap()).unwrap();
    assert!(saved.contains("fd"));
    assert!(!store.is_tracked("fd").unwrap());
}

#[test]
fn missing_paths_are_not_an_error() {
    let (temp, store) = installed_tree();
    fs::remove_dir_all(temp.path().join("build")).unwrap();
    let plan = plan_for(&store, &["ripgrep"], RemovalOptions::default());

    let result = run(&store, &plan, ExecuteOptions::default());

    assert!(result.is_success());
    assert_eq!(result.space_freed, 10);
}

/// A path below a regular file, which can never be deleted.
fn undeletable(root: &Path) -> PathBuf {
    let blocker = root.join("blocker");
    write_bytes(&blocker, 1);
    blocker.join("leftover")
}

#[test]
fn package_manager_removal_untracks_despite_leftover_files() {
    let (temp, store) = temp_store();
    let bin = temp.path().join("bin/rg");
    write_bytes(&bin, 10);
    let mut record = with_method(
        tool("ripgrep", "rust", &[]),
        InstallMethod::LanguagePackageManager,
    );
    record.binary_paths = vec![bin.clone(), undeletable(temp.path())];
    seed(&store, vec![record]);
    let plan = plan_for(&store, &["ripgrep"], RemovalOptions::default());
    let uninstaller = RecordingUninstaller::default();

    let result = RemovalExecutor::new(&store, &uninstaller)
        .execute_plan(&plan, &ExecuteOptions::default())
        .unwrap();

    assert_eq!(
        uninstaller.calls(),
        vec![(RemovalMethod::Cargo, "ripgrep".to_string())]
    );
    assert_eq!(result.failed_names(), vec!["ripgrep"]);
    assert!(result.failed[0].error.contains("left files behind"));
    assert!(result.failed[0].error.contains("leftover"));
    assert!(!bin.exists());
    assert!(!store.is_tracked("ripgrep").unwrap());
}

#[test]
fn file_only_removal_stays_tracked_when_cleanup_fails() {
    let (temp, store) = temp_store();
    let record = with_paths(
        tool("fd", "rust", &[]),
        undeletable(temp.path()),
        None,
    );
    seed(&store, vec![record]);
    let plan = plan_for(&store, &["fd"], RemovalOptions::default());

    let result = run(&store, &plan, ExecuteOptions::default());

    assert_eq!(result.failed_names(), vec!["fd"]);
    assert!(store.is_tracked("fd").unwrap());
}

fn seed_extra(store: &ManifestStore, record: InstallationRecord) {
    store.update(|m| m.upsert(record)).unwrap();
}
