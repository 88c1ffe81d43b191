//! Bundle expansion ordering, deduplication and cycle detection.

mod support;

use std::collections::HashMap;

use gearbox_core::bundle::{BundleResolver, expand_bundle};
use gearbox_core::catalog::BundleSpec;
use gearbox_core::error::GearboxError;

use support::sample_catalog;

fn bundle_map(specs: Vec<BundleSpec>) -> HashMap<String, BundleSpec> {
    specs.into_iter().map(|b| (b.name.clone(), b)).collect()
}

// =========================================================================
// Ordering
// =========================================================================

#[test]
fn included_bundles_precede_direct_tools() {
    let catalog = sample_catalog();
    let tools = BundleResolver::new(&catalog).expand("essentials").unwrap();
    // test-bundle, then search (ripgrep already seen), then direct tools
    assert_eq!(tools, vec!["fd", "ripgrep", "fzf", "bat", "jq"]);
}

#[test]
fn expand_mixed_treats_unknown_names_as_tools() {
    let catalog = sample_catalog();
    let resolver = BundleResolver::new(&catalog);
    let tools = resolver
        .expand_mixed(&["bat", "test-bundle", "jq", "bat", "ripgrep"])
        .unwrap();
    assert_eq!(tools, vec!["bat", "fd", "ripgrep", "jq"]);
}

#[test]
fn expand_mixed_dedups_across_bundles() {
    let catalog = sample_catalog();
    let tools = BundleResolver::new(&catalog)
        .expand_mixed(&["search", "test-bundle"])
        .unwrap();
    assert_eq!(tools, vec!["ripgrep", "fzf", "fd"]);
}

#[test]
fn unknown_bundle_is_reported_by_name() {
    let catalog = sample_catalog();
    let err = BundleResolver::new(&catalog).expand("nope").unwrap_err();
    assert!(matches!(err, GearboxError::UnknownBundle { name } if name == "nope"));
}

#[test]
fn bundles_containing_a_tool() {
    let catalog = sample_catalog();
    let mut owners = BundleResolver::new(&catalog).bundles_containing("ripgrep");
    owners.sort();
    assert_eq!(owners, vec!["essentials", "search", "test-bundle"]);
}

// =========================================================================
// Cycles
// =========================================================================

#[test]
fn diamond_includes_are_not_cycles() {
    let bundles = bundle_map(vec![
        BundleSpec::new("base").with_tools(["jq"]),
        BundleSpec::new("left").with_includes(["base"]).with_tools(["fd"]),
        BundleSpec::new("right").with_includes(["base"]).with_tools(["bat"]),
        BundleSpec::new("top").with_includes(["left", "right"]),
    ]);
    let tools = expand_bundle("top", &bundles, &[]).unwrap();
    assert_eq!(tools, vec!["jq", "fd", "bat"]);
}

#[test]
fn self_include_is_a_cycle() {
    let bundles = bundle_map(vec![BundleSpec::new("loop").with_includes(["loop"])]);
    let err = expand_bundle("loop", &bundles, &[]).unwrap_err();
    match err {
        GearboxError::CircularDependency { chain } => assert_eq!(chain, vec!["loop", "loop"]),
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn transitive_cycle_names_the_root_and_returns_nothing_partial() {
    let bundles = bundle_map(vec![
        BundleSpec::new("a").with_tools(["jq"]).with_includes(["b"]),
        BundleSpec::new("b").with_tools(["fd"]).with_includes(["c"]),
        BundleSpec::new("c").with_includes(["a"]),
    ]);
    let err = expand_bundle("a", &bundles, &[]).unwrap_err();
    let GearboxError::CircularDependency { chain } = &err else {
        panic!("expected cycle, got {err:?}");
    };
    assert_eq!(chain, &vec!["a", "b", "c", "a"]);
    assert!(err.to_string().contains("while expanding 'a'"));
}

#[test]
fn cycle_below_the_root_still_fails_the_root() {
    let bundles = bundle_map(vec![
        BundleSpec::new("root").with_includes(["x"]).with_tools(["jq"]),
        BundleSpec::new("x").with_includes(["y"]),
        BundleSpec::new("y").with_includes(["x"]),
    ]);
    let err = expand_bundle("root", &bundles, &[]).unwrap_err();
    let GearboxError::CircularDependency { chain } = err else {
        panic!("expected cycle");
    };
    assert_eq!(chain.first().map(String::as_str), Some("root"));
    assert_eq!(chain.last().map(String::as_str), Some("x"));
}
