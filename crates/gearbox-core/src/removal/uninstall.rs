//! External uninstall actions.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::plan::RemovalMethod;

/// Runs the package-manager side of a removal.
///
/// File deletion for recorded paths is done by the executor; implementations
/// only handle what a package manager has to undo.
pub trait Uninstaller {
    fn uninstall(&self, method: RemovalMethod, target: &str) -> anyhow::Result<()>;
}

/// Distribution package managers gearbox can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemPackageManager {
    Apt,
    Dnf,
    Pacman,
    Zypper,
    Brew,
}

impl SystemPackageManager {
    const CANDIDATES: [(SystemPackageManager, &'static str); 5] = [
        (Self::Apt, "apt-get"),
        (Self::Dnf, "dnf"),
        (Self::Pacman, "pacman"),
        (Self::Zypper, "zypper"),
        (Self::Brew, "brew"),
    ];

    /// First package manager found on `PATH`.
    pub fn detect() -> Option<Self> {
        let path = env::var_os("PATH")?;
        let dirs: Vec<PathBuf> = env::split_paths(&path).collect();
        Self::detect_in(&dirs)
    }

    pub fn detect_in(dirs: &[PathBuf]) -> Option<Self> {
        Self::CANDIDATES
            .iter()
            .find(|(_, binary)| dirs.iter().any(|dir| is_executable(&dir.join(binary))))
            .map(|(pm, _)| *pm)
    }

    /// Program and arguments that remove `package`.
    pub fn remove_command(&self, package: &str) -> (String, Vec<String>) {
        let (program, args) = match self {
            Self::Apt => ("sudo", vec!["apt-get", "remove", "-y"]),
            Self::Dnf => ("sudo", vec!["dnf", "remove", "-y"]),
            Self::Pacman => ("sudo", vec!["pacman", "-R", "--noconfirm"]),
            Self::Zypper => ("sudo", vec!["zypper", "--non-interactive", "remove"]),
            Self::Brew => ("brew", vec!["uninstall"]),
        };
        let mut args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        args.push(package.to_string());
        (program.to_string(), args)
    }
}

impl fmt::Display for SystemPackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Zypper => "zypper",
            Self::Brew => "brew",
        };
        f.write_str(s)
    }
}

fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Uninstaller that shells out to cargo, pipx, npm and the system package manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandUninstaller {
    system: Option<SystemPackageManager>,
}

impl CommandUninstaller {
    pub fn new(system: Option<SystemPackageManager>) -> Self {
        Self { system }
    }

    /// Command for `method`, or `None` when there is nothing to run.
    pub fn command_for(
        &self,
        method: RemovalMethod,
        target: &str,
    ) -> anyhow::Result<Option<(String, Vec<String>)>> {
        let owned = |program: &str, args: &[&str]| {
            let mut args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
            args.push(target.to_string());
            Some((program.to_string(), args))
        };
        match method {
            RemovalMethod::Cargo => Ok(owned("cargo", &["uninstall"])),
            RemovalMethod::Pipx => Ok(owned("pipx", &["uninstall"])),
            RemovalMethod::Npm => Ok(owned("npm", &["uninstall", "-g"])),
            RemovalMethod::SystemPackage => {
                let pm = self
                    .system
                    .ok_or_else(|| anyhow::anyhow!("No system package manager detected"))?;
                Ok(Some(pm.remove_command(target)))
            }
            // go has no uninstall; the recorded binary is deleted as a file
            RemovalMethod::Go | RemovalMethod::Filesystem | RemovalMethod::BundleMarker => Ok(None),
            RemovalMethod::PreExisting => {
                anyhow::bail!("Cannot remove pre-existing tool '{target}'")
            }
        }
    }
}

impl Uninstaller for CommandUninstaller {
    fn uninstall(&self, method: RemovalMethod, target: &str) -> anyhow::Result<()> {
        let Some((program, args)) = self.command_for(method, target)? else {
            return Ok(());
        };
        debug!(%program, ?args, "Running uninstall command");
        let output = Command::new(&program)
            .args(&args)
            .output()
            .with_context(|| format!("Failed to run {program} for '{target}'"))?;
        if !output.status.success() {
            anyhow::bail!(
                "{program} {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}
