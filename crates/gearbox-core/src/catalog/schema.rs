//! Catalog schema for tools.toml and bundles.toml
//!
//! Tools are declared as `[[tool]]` tables, bundles as `[[bundle]]` tables.
//! Bundles reference tools and other bundles by name only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::manifest::InstallMethod;
use crate::types::BuildProfile;

/// Root of tools.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsDocument {
    #[serde(default, rename = "tool")]
    pub tools: Vec<ToolSpec>,
}

/// Root of bundles.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundlesDocument {
    #[serde(default, rename = "bundle")]
    pub bundles: Vec<BundleSpec>,
}

/// A single installable tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: String,

    /// Implementation language, used for install ordering and for picking
    /// the language package manager on removal.
    pub language: String,

    /// Build profile name -> flag passed to the build action.
    #[serde(default)]
    pub build_types: BTreeMap<String, String>,

    /// Profile whose flag is used when the requested one is not declared.
    #[serde(default)]
    pub default_build_type: BuildProfile,

    #[serde(default)]
    pub dependencies: Vec<String>,

    pub binary_name: String,

    #[serde(default)]
    pub version_command: String,

    #[serde(default)]
    pub install_method: InstallMethod,
}

/// Flag chosen for a build, and whether it came from the fallback profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFlag {
    pub flag: String,
    pub profile: BuildProfile,
    pub fell_back: bool,
}

impl ToolSpec {
    /// Resolve the build flag for `profile`.
    ///
    /// Unsupported profiles fall back to the tool's default profile flag, and
    /// to an empty flag when even that is missing.
    pub fn flag_for(&self, profile: BuildProfile) -> ProfileFlag {
        if let Some(flag) = self.build_types.get(profile.as_str()) {
            return ProfileFlag {
                flag: flag.clone(),
                profile,
                fell_back: false,
            };
        }
        let flag = self
            .build_types
            .get(self.default_build_type.as_str())
            .cloned()
            .unwrap_or_default();
        ProfileFlag {
            flag,
            profile: self.default_build_type,
            fell_back: true,
        }
    }
}

/// A named group of tools and/or other bundles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSpec {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: String,

    /// Tools listed directly in this bundle.
    #[serde(default)]
    pub tools: Vec<String>,

    /// Other bundles pulled in by this one.
    #[serde(default)]
    pub includes: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl BundleSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category: String::new(),
            tools: Vec::new(),
            includes: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_includes<I, S>(mut self, includes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes = includes.into_iter().map(Into::into).collect();
        self
    }
}
