//! Build action seam.
//!
//! The orchestrator never knows how a tool is compiled. It hands a tool and
//! a build flag to a [`BuildAction`] and gets back success plus captured
//! output.

use std::path::PathBuf;
use std::process::Command;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::ToolSpec;

/// Flags forwarded to the build action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    pub skip_deps: bool,
    pub force: bool,
    pub run_tests: bool,
    pub verbose: bool,
    pub dry_run: bool,
}

/// What a build action reports back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutcome {
    pub success: bool,
    pub output: String,
    /// Version detected after the build, when the action knows it.
    pub version: Option<String>,
}

impl BuildOutcome {
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            version: None,
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Builds and installs one tool.
///
/// Called from worker threads; implementations must not assume any ordering
/// between calls for different tools.
pub trait BuildAction: Send + Sync {
    fn execute(
        &self,
        tool: &ToolSpec,
        flag: &str,
        options: &BuildOptions,
    ) -> anyhow::Result<BuildOutcome>;
}

/// Runs `<scripts_dir>/install-<tool>.sh` for each tool.
#[derive(Debug, Clone)]
pub struct ScriptBuildAction {
    scripts_dir: PathBuf,
}

impl ScriptBuildAction {
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
        }
    }

    pub fn script_path(&self, tool: &str) -> PathBuf {
        self.scripts_dir.join(format!("install-{tool}.sh"))
    }

    /// Arguments passed to the install script.
    pub fn script_args(flag: &str, options: &BuildOptions) -> Vec<String> {
        let mut args = Vec::new();
        if !flag.is_empty() {
            args.push(flag.to_string());
        }
        let switches = [
            (options.skip_deps, "--skip-deps"),
            (options.force, "--force"),
            (options.run_tests, "--run-tests"),
            (options.verbose, "--verbose"),
            (options.dry_run, "--dry-run"),
        ];
        args.extend(
            switches
                .iter()
                .filter(|(on, _)| *on)
                .map(|(_, s)| s.to_string()),
        );
        args
    }

    fn detect_version(tool: &ToolSpec) -> Option<String> {
        if tool.version_command.trim().is_empty() {
            return None;
        }
        let output = Command::new("sh")
            .arg("-c")
            .arg(&tool.version_command)
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
    }
}

impl BuildAction for ScriptBuildAction {
    fn execute(
        &self,
        tool: &ToolSpec,
        flag: &str,
        options: &BuildOptions,
    ) -> anyhow::Result<BuildOutcome> {
        let script = self.script_path(&tool.name);
        if !script.exists() {
            anyhow::bail!("Install script not found: {}", script.display());
        }

        let args = Self::script_args(flag, options);
        debug!(tool = %tool.name, script = %script.display(), ?args, "Running install script");

        let output = Command::new("bash")
            .arg(&script)
            .args(&args)
            .output()
            .with_context(|| format!("Failed to run install script: {}", script.display()))?;

        let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
        captured.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Ok(BuildOutcome::failed(captured));
        }

        let mut outcome = BuildOutcome::succeeded(captured);
        if !options.dry_run {
            if let Some(version) = Self::detect_version(tool) {
                outcome = outcome.with_version(version);
            }
        }
        Ok(outcome)
    }
}
