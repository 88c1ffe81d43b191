//! Bundle expansion.
//!
//! Expands bundle names into a flat, deduplicated list of tool names.
//!
//! ## Ordering
//!
//! Included bundles are expanded before the bundle's own direct tools, and
//! the first occurrence of a tool wins:
//!
//! ```text
//! dev      = includes [core], tools [jq, fd]
//! core     = tools [fd, ripgrep]
//!
//! expand("dev") = [fd, ripgrep, jq]
//! ```
//!
//! ## Cycle detection
//!
//! Each recursive call receives its own copy of the current expansion path.
//! Siblings never share cycle-detection state, so a bundle included twice
//! from different branches (a diamond) is fine, while a bundle that reaches
//! itself fails the whole expansion.

use std::collections::HashSet;

use crate::catalog::{BundleLookup, ConfigCatalog};
use crate::error::{GearboxError, Result};

/// Expand `name` against an arbitrary bundle set.
///
/// `path` holds the bundles currently being expanded above this call, root
/// first. Pass an empty slice for a top-level expansion.
pub fn expand_bundle<L>(name: &str, bundles: &L, path: &[String]) -> Result<Vec<String>>
where
    L: BundleLookup + ?Sized,
{
    if path.iter().any(|p| p == name) {
        let mut chain = path.to_vec();
        chain.push(name.to_string());
        return Err(GearboxError::CircularDependency { chain });
    }

    let bundle = bundles
        .bundle(name)
        .ok_or_else(|| GearboxError::UnknownBundle {
            name: name.to_string(),
        })?;

    let mut branch_path = path.to_vec();
    branch_path.push(name.to_string());

    let mut tools = Vec::new();
    for include in &bundle.includes {
        tools.extend(expand_bundle(include, bundles, &branch_path)?);
    }
    tools.extend(bundle.tools.iter().cloned());

    Ok(dedup_preserving_order(tools))
}

/// Remove duplicates, keeping the first occurrence of each name.
pub fn dedup_preserving_order<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Resolver bound to a catalog.
#[derive(Debug, Clone, Copy)]
pub struct BundleResolver<'a> {
    catalog: &'a ConfigCatalog,
}

impl<'a> BundleResolver<'a> {
    pub fn new(catalog: &'a ConfigCatalog) -> Self {
        Self { catalog }
    }

    /// Expand a single bundle name.
    pub fn expand(&self, name: &str) -> Result<Vec<String>> {
        expand_bundle(name, self.catalog, &[])
    }

    /// Expand a mixed list of bundle and tool names.
    ///
    /// Names found in the catalog as bundles are expanded; everything else is
    /// taken as a literal tool name. Duplicates across the whole input are
    /// dropped, first occurrence wins. Tool names are not validated here.
    pub fn expand_mixed<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for name in names {
            let name = name.as_ref();
            if self.catalog.is_bundle(name) {
                out.extend(self.expand(name)?);
            } else {
                out.push(name.to_string());
            }
        }
        Ok(dedup_preserving_order(out))
    }

    /// Bundles in the catalog that contain `tool` after expansion.
    ///
    /// Bundles whose expansion fails (cycles) are skipped.
    pub fn bundles_containing(&self, tool: &str) -> Vec<String> {
        self.catalog
            .all_bundles()
            .iter()
            .filter(|b| {
                self.expand(&b.name)
                    .map(|tools| tools.iter().any(|t| t == tool))
                    .unwrap_or(false)
            })
            .map(|b| b.name.clone())
            .collect()
    }
}
