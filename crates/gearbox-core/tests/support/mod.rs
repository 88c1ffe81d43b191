#![allow(dead_code)]

use std::path::PathBuf;

use gearbox_core::catalog::ConfigCatalog;
use gearbox_core::manifest::{InstallMethod, InstallationRecord, Manifest, ManifestStore};
use tempfile::TempDir;

pub const TOOLS: &str = r#"
[[tool]]
name = "ripgrep"
language = "rust"
binary_name = "rg"
build_types = { minimal = "-m", standard = "-r", maximum = "-r --all-features" }

[[tool]]
name = "fd"
language = "rust"
binary_name = "fd"
build_types = { standard = "-r" }

[[tool]]
name = "bat"
language = "rust"
binary_name = "bat"
build_types = { standard = "-r" }

[[tool]]
name = "jq"
language = "c"
binary_name = "jq"
build_types = { standard = "--release" }

[[tool]]
name = "lazygit"
language = "go"
binary_name = "lazygit"
build_types = { standard = "" }

[[tool]]
name = "fzf"
language = "go"
binary_name = "fzf"
build_types = { standard = "" }

[[tool]]
name = "black"
language = "python"
binary_name = "black"
install_method = "language-package-manager"

[[tool]]
name = "prettier"
language = "nodejs"
binary_name = "prettier"
install_method = "language-package-manager"

[[tool]]
name = "shellcheck"
language = "haskell"
binary_name = "shellcheck"
"#;

pub const BUNDLES: &str = r#"
[[bundle]]
name = "test-bundle"
tools = ["fd", "ripgrep"]

[[bundle]]
name = "search"
tools = ["ripgrep", "fzf"]

[[bundle]]
name = "essentials"
tools = ["bat", "jq"]
includes = ["test-bundle", "search"]
"#;

pub fn sample_catalog() -> ConfigCatalog {
    ConfigCatalog::from_toml_str(TOOLS, BUNDLES).expect("sample catalog is valid")
}

pub fn temp_store() -> (TempDir, ManifestStore) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let store = ManifestStore::in_dir(temp.path());
    (temp, store)
}

/// Source-built tool record with its build directory under `root`.
pub fn tool(name: &str, language: &str, deps: &[&str]) -> InstallationRecord {
    let mut record = InstallationRecord::new(name, InstallMethod::SourceBuild);
    record.version = "1.0.0".to_string();
    record.language = Some(language.to_string());
    record.dependencies = deps.iter().map(|d| d.to_string()).collect();
    record
}

pub fn with_method(mut record: InstallationRecord, method: InstallMethod) -> InstallationRecord {
    record.method = method;
    record
}

pub fn with_paths(
    mut record: InstallationRecord,
    binary: PathBuf,
    build_dir: Option<PathBuf>,
) -> InstallationRecord {
    record.binary_paths = vec![binary];
    record.build_dir = build_dir;
    record
}

pub fn pre_existing(name: &str) -> InstallationRecord {
    let mut record = InstallationRecord::new(name, InstallMethod::PreExisting);
    record.binary_paths = vec![PathBuf::from(format!("/usr/bin/{name}"))];
    record
}

pub fn seed(store: &ManifestStore, records: Vec<InstallationRecord>) {
    let mut manifest = Manifest::new();
    for record in records {
        manifest.upsert(record);
    }
    store.save(&manifest).expect("Failed to seed manifest");
}
