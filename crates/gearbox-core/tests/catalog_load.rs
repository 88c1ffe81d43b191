//! Catalog loading and validation.
//!
//! Covers reading the tools/bundles documents from disk, eager reference
//! validation, and the hot-reload wrapper.

mod support;

use std::thread;

use gearbox_core::catalog::{ConfigCatalog, SharedCatalog};
use gearbox_core::error::GearboxError;
use gearbox_core::manifest::InstallMethod;
use gearbox_core::types::BuildProfile;
use tempfile::TempDir;

use support::{BUNDLES, TOOLS, sample_catalog};

fn config_message(err: GearboxError) -> String {
    match err {
        GearboxError::Config { message } => message,
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn load_reads_both_documents() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let tools = temp.path().join("tools.toml");
    let bundles = temp.path().join("bundles.toml");
    std::fs::write(&tools, TOOLS).expect("Failed to write tools");
    std::fs::write(&bundles, BUNDLES).expect("Failed to write bundles");

    let catalog = ConfigCatalog::load(&tools, Some(&bundles)).unwrap();

    assert_eq!(catalog.all_tools().len(), 9);
    assert_eq!(catalog.all_bundles().len(), 3);
    let rg = catalog.find_tool("ripgrep").unwrap();
    assert_eq!(rg.binary_name, "rg");
    assert_eq!(rg.flag_for(BuildProfile::Maximum).flag, "-r --all-features");
    assert_eq!(
        catalog.find_tool("black").unwrap().install_method,
        InstallMethod::LanguagePackageManager
    );
    assert!(catalog.is_bundle("essentials"));
    assert!(!catalog.is_bundle("ripgrep"));
}

#[test]
fn missing_bundles_file_means_no_bundles() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let tools = temp.path().join("tools.toml");
    std::fs::write(&tools, TOOLS).expect("Failed to write tools");

    let catalog = ConfigCatalog::load(&tools, Some(&temp.path().join("bundles.toml"))).unwrap();
    assert!(catalog.all_bundles().is_empty());
    assert!(catalog.find_bundle("test-bundle").is_none());
}

#[test]
fn missing_tools_file_is_a_config_error() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let err = ConfigCatalog::load(&temp.path().join("tools.toml"), None).unwrap_err();
    assert!(config_message(err).contains("tools.toml"));
}

#[test]
fn malformed_toml_reports_the_line() {
    let tools = "[[tool]]\nname = \"rg\"\nlanguage = \n";
    let err = ConfigCatalog::from_toml_str(tools, "").unwrap_err();
    assert!(config_message(err).contains("line 3"));
}

#[test]
fn bundle_with_undefined_tool_fails_at_load() {
    let bundles = r#"
[[bundle]]
name = "broken"
tools = ["ripgrep", "nonexistent"]
"#;
    let err = ConfigCatalog::from_toml_str(TOOLS, bundles).unwrap_err();
    let message = config_message(err);
    assert!(message.contains("broken"));
    assert!(message.contains("nonexistent"));
}

#[test]
fn bundle_with_undefined_include_fails_at_load() {
    let bundles = r#"
[[bundle]]
name = "outer"
includes = ["inner"]
"#;
    let err = ConfigCatalog::from_toml_str(TOOLS, bundles).unwrap_err();
    assert!(config_message(err).contains("undefined bundle 'inner'"));
}

#[test]
fn duplicate_and_colliding_names_are_rejected() {
    let dup = format!("{TOOLS}\n[[tool]]\nname = \"fd\"\nlanguage = \"rust\"\nbinary_name = \"fd\"\n");
    assert!(ConfigCatalog::from_toml_str(&dup, "").is_err());

    let collide = "[[bundle]]\nname = \"jq\"\ntools = [\"jq\"]\n";
    let err = ConfigCatalog::from_toml_str(TOOLS, collide).unwrap_err();
    assert!(config_message(err).contains("same name as a tool"));
}

#[test]
fn unknown_build_type_key_is_rejected() {
    let tools = r#"
[[tool]]
name = "rg"
language = "rust"
binary_name = "rg"
build_types = { turbo = "-O3" }
"#;
    let err = ConfigCatalog::from_toml_str(tools, "").unwrap_err();
    assert!(config_message(err).contains("turbo"));
}

#[test]
fn shared_catalog_swaps_without_disturbing_readers() {
    let shared = SharedCatalog::new(sample_catalog());
    let before = shared.snapshot();

    let smaller = ConfigCatalog::from_toml_str(
        "[[tool]]\nname = \"jq\"\nlanguage = \"c\"\nbinary_name = \"jq\"\n",
        "",
    )
    .unwrap();

    let writer = {
        let shared = shared.clone();
        thread::spawn(move || shared.replace(smaller))
    };
    writer.join().expect("writer thread panicked");

    assert_eq!(before.all_tools().len(), 9);
    assert_eq!(shared.snapshot().all_tools().len(), 1);
    assert!(shared.snapshot().find_tool("ripgrep").is_none());
}
