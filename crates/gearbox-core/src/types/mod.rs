//! Shared core types used across the catalog, installer and removal layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Build profile requested for an install run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum BuildProfile {
    /// Smallest feature set, fastest build.
    Minimal,
    /// Recommended defaults.
    #[default]
    Standard,
    /// Every optional feature enabled.
    Maximum,
}

impl BuildProfile {
    pub const ALL: [BuildProfile; 3] = [Self::Minimal, Self::Standard, Self::Maximum];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Standard => "standard",
            Self::Maximum => "maximum",
        }
    }

    /// Rough peak memory one build job needs under this profile, in MiB.
    pub fn estimated_job_memory_mb(&self) -> u64 {
        match self {
            Self::Minimal => 512,
            Self::Standard => 1024,
            Self::Maximum => 2048,
        }
    }
}

impl fmt::Display for BuildProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimal" | "min" => Ok(Self::Minimal),
            "standard" | "std" => Ok(Self::Standard),
            "maximum" | "max" => Ok(Self::Maximum),
            other => Err(format!(
                "Invalid build type: '{other}'. Use 'minimal', 'standard' or 'maximum'"
            )),
        }
    }
}

/// How loudly the removal planner warns about risky removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SafetyLevel {
    /// Warn on every planned removal.
    Conservative,
    #[default]
    Standard,
    /// Only warn about forced removals and shared dependencies.
    Aggressive,
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Conservative => "conservative",
            Self::Standard => "standard",
            Self::Aggressive => "aggressive",
        };
        f.write_str(s)
    }
}

impl FromStr for SafetyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "standard" => Ok(Self::Standard),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(format!(
                "Invalid safety level: '{other}'. Use 'conservative', 'standard' or 'aggressive'"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_profile_parses_aliases() {
        assert_eq!("MAX".parse::<BuildProfile>(), Ok(BuildProfile::Maximum));
        assert_eq!("min".parse::<BuildProfile>(), Ok(BuildProfile::Minimal));
        assert!("huge".parse::<BuildProfile>().is_err());
    }

    #[test]
    fn safety_level_round_trips_display() {
        for level in [
            SafetyLevel::Conservative,
            SafetyLevel::Standard,
            SafetyLevel::Aggressive,
        ] {
            assert_eq!(level.to_string().parse::<SafetyLevel>(), Ok(level));
        }
    }
}
