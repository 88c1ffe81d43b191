//! Safety-level checks over a finished plan.
//!
//! Validation only adds warnings; it never blocks a plan. Mapping warnings to
//! confirmation prompts is up to the caller.

use super::plan::{DependencyDecision, PlanWarning, RemovalMethod, RemovalPlan, WarningLevel};
use crate::types::SafetyLevel;

pub fn validate_plan(plan: &RemovalPlan, level: SafetyLevel) -> Vec<PlanWarning> {
    let mut warnings = Vec::new();

    for action in plan.to_remove.iter().filter(|a| !a.is_safe) {
        warnings.push(PlanWarning::new(
            &action.target,
            WarningLevel::Critical,
            format!("Unsafe removal of '{}': {}", action.target, action.reason),
        ));
    }

    for dep in &plan.dependencies {
        if dep.action == DependencyDecision::CascadeDelete && dep.affected.len() > 1 {
            warnings.push(PlanWarning::new(
                &dep.dependency,
                WarningLevel::Warning,
                format!(
                    "Shared dependency '{}' will be removed; it was used by: {}",
                    dep.dependency,
                    dep.affected.join(", ")
                ),
            ));
        }
    }

    match level {
        SafetyLevel::Conservative => {
            for action in &plan.to_remove {
                let what = match action.method {
                    RemovalMethod::BundleMarker => "bundle marker".to_string(),
                    method => format!("{method} removal"),
                };
                warnings.push(PlanWarning::new(
                    &action.target,
                    WarningLevel::Info,
                    format!("'{}' will be removed ({what})", action.target),
                ));
            }
        }
        SafetyLevel::Standard => {}
        SafetyLevel::Aggressive => {
            if plan.to_keep.len() > plan.to_remove.len() {
                warnings.push(PlanWarning::new(
                    "",
                    WarningLevel::Info,
                    format!(
                        "{} target(s) kept and {} removed; use --force to remove kept targets",
                        plan.to_keep.len(),
                        plan.to_remove.len()
                    ),
                ));
            }
        }
    }

    warnings
}
