//! Plan rendering and confirmation for destructive commands.
//!
//! Uses dialoguer for the confirmation prompt and console for styling.

use std::io::{self, Write};

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};

use gearbox_core::fs::format_size;
use gearbox_core::removal::{
    DependencyDecision, PlanWarning, RemovalPlan, RemovalResult, WarningLevel,
};

/// Shows a removal plan and asks before it runs.
pub struct RemovalPrompt<W: Write = io::Stdout> {
    /// Skip the confirmation (`--yes`)
    yes: bool,
    /// Output writer (for testing)
    writer: W,
    theme: ColorfulTheme,
}

impl RemovalPrompt<io::Stdout> {
    pub fn new(yes: bool) -> Self {
        Self {
            yes,
            writer: io::stdout(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl<W: Write> RemovalPrompt<W> {
    #[cfg(test)]
    pub fn with_writer(yes: bool, writer: W) -> Self {
        Self {
            yes,
            writer,
            theme: ColorfulTheme::default(),
        }
    }

    #[cfg(test)]
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Print the plan, its dependency decisions and every warning.
    pub fn show_plan(&mut self, plan: &RemovalPlan, validation: &[PlanWarning]) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style("  Removal plan").bold())?;
        writeln!(self.writer, "  ───────────────────────────")?;

        if plan.to_remove.is_empty() {
            writeln!(self.writer, "  Nothing to remove.")?;
        }
        for action in &plan.to_remove {
            let marker = if action.is_safe {
                style("-").red()
            } else {
                style("!").red().bold()
            };
            writeln!(
                self.writer,
                "  {marker} {:<20} {:<15} {}",
                action.target, action.method, action.reason
            )?;
            for path in &action.paths {
                writeln!(self.writer, "      {}", style(path.display()).dim())?;
            }
        }

        if !plan.to_keep.is_empty() {
            writeln!(self.writer)?;
            writeln!(self.writer, "  {}", style("Kept").bold())?;
            for keep in &plan.to_keep {
                writeln!(
                    self.writer,
                    "  {} {:<20} {}",
                    style("=").green(),
                    keep.target,
                    keep.reasons.join("; ")
                )?;
            }
        }

        if !plan.dependencies.is_empty() {
            writeln!(self.writer)?;
            writeln!(self.writer, "  {}", style("Dependencies").bold())?;
            for dep in &plan.dependencies {
                let decision = match dep.action {
                    DependencyDecision::Preserve => style(dep.action.to_string()).green(),
                    DependencyDecision::CascadeDelete => style(dep.action.to_string()).yellow(),
                };
                writeln!(
                    self.writer,
                    "    {:<20} {:<15} {}",
                    dep.dependency, decision, dep.reason
                )?;
            }
        }

        let warnings: Vec<&PlanWarning> = plan.warnings.iter().chain(validation).collect();
        if !warnings.is_empty() {
            writeln!(self.writer)?;
            for warning in warnings {
                let label = match warning.level {
                    WarningLevel::Info => style("info").cyan(),
                    WarningLevel::Warning => style("warning").yellow(),
                    WarningLevel::Critical => style("critical").red().bold(),
                };
                writeln!(self.writer, "  {label}: {}", warning.message)?;
            }
        }

        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "  {} to remove, {} kept, {} unsafe",
            plan.summary.will_remove, plan.summary.will_keep, plan.summary.unsafe_removals
        )?;
        Ok(())
    }

    /// Ask before executing. Critical warnings flip the default to "no".
    pub fn confirm(&mut self, plan: &RemovalPlan, validation: &[PlanWarning]) -> Result<bool> {
        if self.yes {
            return Ok(true);
        }
        let critical = plan
            .warnings
            .iter()
            .chain(validation)
            .any(|w| w.level == WarningLevel::Critical);

        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt(format!("Remove {} target(s)?", plan.summary.will_remove))
            .default(!critical)
            .interact()?;
        Ok(confirmed)
    }

    pub fn show_result(&mut self, result: &RemovalResult) -> Result<()> {
        let verb = if result.dry_run { "Would remove" } else { "Removed" };
        for target in &result.removed {
            writeln!(self.writer, "✓ {verb} '{target}'")?;
        }
        for failed in &result.failed {
            writeln!(
                self.writer,
                "✗ Failed to remove '{}': {}",
                failed.target, failed.error
            )?;
        }
        if let Some(backup) = &result.backup_path {
            writeln!(self.writer, "  Manifest backup: {}", backup.display())?;
        }
        if !result.dry_run {
            writeln!(
                self.writer,
                "  Space freed: {}",
                format_size(result.space_freed)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gearbox_core::removal::{
        FailedRemoval, KeepEntry, RemovalAction, RemovalMethod, RemovalResult,
    };

    fn sample_plan() -> RemovalPlan {
        let mut plan = RemovalPlan {
            to_remove: vec![RemovalAction {
                target: "ripgrep".to_string(),
                method: RemovalMethod::Cargo,
                paths: vec!["/home/u/.local/bin/rg".into()],
                is_safe: true,
                reason: "tracked as language-package-manager".to_string(),
            }],
            to_keep: vec![KeepEntry {
                target: "git".to_string(),
                reasons: vec!["pre-existing - not gearbox-managed".to_string()],
            }],
            ..Default::default()
        };
        plan.refresh_summary();
        plan
    }

    fn render(plan: &RemovalPlan) -> String {
        let mut prompt = RemovalPrompt::with_writer(true, Vec::new());
        prompt.show_plan(plan, &[]).unwrap();
        String::from_utf8(prompt.into_writer()).unwrap()
    }

    #[test]
    fn plan_lists_removals_and_kept_targets() {
        let output = render(&sample_plan());
        assert!(output.contains("ripgrep"));
        assert!(output.contains("/home/u/.local/bin/rg"));
        assert!(output.contains("pre-existing - not gearbox-managed"));
        assert!(output.contains("1 to remove, 1 kept, 0 unsafe"));
    }

    #[test]
    fn empty_plan_says_so() {
        let output = render(&RemovalPlan::default());
        assert!(output.contains("Nothing to remove."));
    }

    #[test]
    fn yes_skips_the_prompt() {
        let mut prompt = RemovalPrompt::with_writer(true, Vec::new());
        assert!(prompt.confirm(&sample_plan(), &[]).unwrap());
    }

    #[test]
    fn result_reports_failures() {
        let result = RemovalResult {
            removed: vec!["fd".to_string()],
            failed: vec![FailedRemoval {
                target: "bat".to_string(),
                error: "cargo uninstall of 'bat' failed".to_string(),
            }],
            space_freed: 2048,
            ..Default::default()
        };
        let mut prompt = RemovalPrompt::with_writer(true, Vec::new());
        prompt.show_result(&result).unwrap();
        let output = String::from_utf8(prompt.into_writer()).unwrap();
        assert!(output.contains("Removed 'fd'"));
        assert!(output.contains("Failed to remove 'bat'"));
        assert!(output.contains("2.0 KiB"));
    }
}
