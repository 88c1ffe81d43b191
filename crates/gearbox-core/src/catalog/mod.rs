//! Tool and bundle catalog.
//!
//! The catalog is loaded once, validated eagerly, and is read-only after
//! construction. It is shared by reference between the resolver, the install
//! orchestrator and the removal planner. [`SharedCatalog`] covers the
//! hot-reload case by swapping whole catalogs behind a lock.

pub mod parser;
pub mod schema;

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::{GearboxError, Result};
use crate::types::BuildProfile;

pub use parser::{parse_bundles_file, parse_bundles_str, parse_tools_file, parse_tools_str};
pub use schema::{BundleSpec, BundlesDocument, ProfileFlag, ToolSpec, ToolsDocument};

/// Lookup of bundle definitions by name.
///
/// Implemented by [`ConfigCatalog`] and by plain maps so bundle expansion can
/// run against ad hoc bundle sets.
pub trait BundleLookup {
    fn bundle(&self, name: &str) -> Option<&BundleSpec>;
}

impl BundleLookup for HashMap<String, BundleSpec> {
    fn bundle(&self, name: &str) -> Option<&BundleSpec> {
        self.get(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigCatalog {
    tools: Vec<ToolSpec>,
    bundles: Vec<BundleSpec>,
    tool_index: HashMap<String, usize>,
    bundle_index: HashMap<String, usize>,
}

impl ConfigCatalog {
    /// Build a catalog from already-parsed specs, validating references.
    pub fn new(tools: Vec<ToolSpec>, bundles: Vec<BundleSpec>) -> Result<Self> {
        let mut tool_index = HashMap::with_capacity(tools.len());
        for (i, tool) in tools.iter().enumerate() {
            validate_tool(tool)?;
            if tool_index.insert(tool.name.clone(), i).is_some() {
                return Err(GearboxError::config(format!(
                    "Tool '{}' is defined more than once",
                    tool.name
                )));
            }
        }

        let mut bundle_index = HashMap::with_capacity(bundles.len());
        for (i, bundle) in bundles.iter().enumerate() {
            if bundle.name.trim().is_empty() {
                return Err(GearboxError::config("Bundle with an empty name"));
            }
            if tool_index.contains_key(&bundle.name) {
                return Err(GearboxError::config(format!(
                    "Bundle '{}' has the same name as a tool",
                    bundle.name
                )));
            }
            if bundle_index.insert(bundle.name.clone(), i).is_some() {
                return Err(GearboxError::config(format!(
                    "Bundle '{}' is defined more than once",
                    bundle.name
                )));
            }
        }

        for bundle in &bundles {
            for tool in &bundle.tools {
                if !tool_index.contains_key(tool) {
                    return Err(GearboxError::config(format!(
                        "Bundle '{}' references undefined tool '{}'",
                        bundle.name, tool
                    )));
                }
            }
            for include in &bundle.includes {
                if !bundle_index.contains_key(include) {
                    return Err(GearboxError::config(format!(
                        "Bundle '{}' includes undefined bundle '{}'",
                        bundle.name, include
                    )));
                }
            }
        }

        debug!(
            tools = tools.len(),
            bundles = bundles.len(),
            "Loaded tool catalog"
        );

        Ok(Self {
            tools,
            bundles,
            tool_index,
            bundle_index,
        })
    }

    /// Load tools.toml and (optionally) bundles.toml.
    ///
    /// A missing bundles file means "no bundles"; a missing tools file is an error.
    pub fn load(tools_path: &Path, bundles_path: Option<&Path>) -> Result<Self> {
        let tools = parse_tools_file(tools_path)?;
        let bundles = match bundles_path {
            Some(path) if path.exists() => parse_bundles_file(path)?,
            _ => BundlesDocument::default(),
        };
        Self::new(tools.tools, bundles.bundles)
    }

    pub fn from_toml_str(tools: &str, bundles: &str) -> Result<Self> {
        Self::new(
            parse_tools_str(tools)?.tools,
            parse_bundles_str(bundles)?.bundles,
        )
    }

    pub fn find_tool(&self, name: &str) -> Option<&ToolSpec> {
        self.tool_index.get(name).map(|&i| &self.tools[i])
    }

    pub fn find_bundle(&self, name: &str) -> Option<&BundleSpec> {
        self.bundle_index.get(name).map(|&i| &self.bundles[i])
    }

    pub fn is_bundle(&self, name: &str) -> bool {
        self.bundle_index.contains_key(name)
    }

    /// Tools in declaration order.
    pub fn all_tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    /// Bundles in declaration order.
    pub fn all_bundles(&self) -> &[BundleSpec] {
        &self.bundles
    }
}

impl BundleLookup for ConfigCatalog {
    fn bundle(&self, name: &str) -> Option<&BundleSpec> {
        self.find_bundle(name)
    }
}

fn validate_tool(tool: &ToolSpec) -> Result<()> {
    if tool.name.trim().is_empty() {
        return Err(GearboxError::config("Tool with an empty name"));
    }
    if tool.language.trim().is_empty() {
        return Err(GearboxError::config(format!(
            "Tool '{}' has no language",
            tool.name
        )));
    }
    for key in tool.build_types.keys() {
        if !BuildProfile::ALL.iter().any(|p| p.as_str() == key) {
            return Err(GearboxError::config(format!(
                "Tool '{}' declares unknown build type '{}'",
                tool.name, key
            )));
        }
    }
    let mut seen = HashSet::new();
    for dep in &tool.dependencies {
        if dep == &tool.name {
            return Err(GearboxError::config(format!(
                "Tool '{}' depends on itself",
                tool.name
            )));
        }
        if !seen.insert(dep) {
            return Err(GearboxError::config(format!(
                "Tool '{}' lists dependency '{}' twice",
                tool.name, dep
            )));
        }
    }
    Ok(())
}

/// Catalog handle that supports atomic replacement.
///
/// Readers take a cheap `Arc` snapshot; a reload swaps the pointer and never
/// mutates a catalog in place.
#[derive(Debug, Clone, Default)]
pub struct SharedCatalog {
    inner: Arc<RwLock<Arc<ConfigCatalog>>>,
}

impl SharedCatalog {
    pub fn new(catalog: ConfigCatalog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(catalog))),
        }
    }

    pub fn snapshot(&self) -> Arc<ConfigCatalog> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn replace(&self, catalog: ConfigCatalog) {
        let next = Arc::new(catalog);
        match self.inner.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}
