//! Gearbox - developer tool installer
//!
//! Usage:
//!   gearbox install <names...>          # Build and install tools or bundles
//!   gearbox uninstall <names...>        # Plan, confirm and remove
//!   gearbox uninstall-plan <names...>   # Show what a removal would do
//!   gearbox list                        # Show tracked tools

mod interactive;

use std::path::PathBuf;

use anyhow::Result;
use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gearbox_core::context::{GearboxContext, GearboxContextBuilder};
use gearbox_core::error::GearboxError;
use gearbox_core::install::{BuildOptions, InstallReport, MAX_PARALLEL_JOBS};
use gearbox_core::manifest::InstallationRecord;
use gearbox_core::removal::{ExecuteOptions, RemovalOptions, RemovalPlan, validate_plan};
use gearbox_core::types::{BuildProfile, SafetyLevel};

use crate::interactive::RemovalPrompt;

#[derive(Parser)]
#[command(name = "gearbox")]
#[command(about = "Build, install and remove developer tools", long_about = None)]
struct Cli {
    /// Keep config, state and binaries under this directory
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install tools and bundles
    Install(InstallArgs),

    /// Remove tracked tools and bundles
    #[command(alias = "rm")]
    Uninstall(UninstallArgs),

    /// Show the removal plan without executing it
    UninstallPlan {
        #[command(flatten)]
        removal: RemovalArgs,

        /// Safety level for plan validation (defaults to the configured level)
        #[arg(long)]
        safety: Option<SafetyLevel>,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        format: OutputFormat,
    },

    /// List tracked tools and bundles
    List {
        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Args)]
struct InstallArgs {
    /// Tool or bundle names
    #[arg(required = true)]
    names: Vec<String>,
    /// Build type (minimal, standard, maximum); defaults to the configured one
    #[arg(long, short = 'b')]
    build_type: Option<BuildProfile>,
    /// Parallel jobs (0-8); 0 auto-detects
    #[arg(
        long,
        short = 'j',
        value_parser = RangedU64ValueParser::<usize>::new().range(0..=MAX_PARALLEL_JOBS as u64)
    )]
    jobs: Option<usize>,
    /// Show the plan without building anything
    #[arg(long)]
    dry_run: bool,
    /// Do not install build dependencies
    #[arg(long)]
    skip_deps: bool,
    /// Rebuild even if already installed
    #[arg(long, short)]
    force: bool,
    /// Run the tool's test suite after building
    #[arg(long)]
    run_tests: bool,
    /// Pass verbose output through from the build
    #[arg(long, short)]
    verbose: bool,
    /// Output format
    #[arg(short = 'o', long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Args)]
struct RemovalArgs {
    /// Tool or bundle names
    #[arg(required = true)]
    names: Vec<String>,
    /// Remove even when dependents exist or the tool is pre-existing
    #[arg(long, short)]
    force: bool,
    /// Also remove dependencies nothing else needs
    #[arg(long)]
    cascade: bool,
    /// Also delete recorded config files
    #[arg(long)]
    remove_config: bool,
    /// Removing a bundle also removes its tools
    #[arg(long)]
    remove_bundle_contents: bool,
}

impl RemovalArgs {
    fn options(&self) -> RemovalOptions {
        RemovalOptions {
            force: self.force,
            cascade: self.cascade,
            remove_config: self.remove_config,
            remove_bundle_contents: self.remove_bundle_contents,
        }
    }
}

#[derive(Args)]
struct UninstallArgs {
    #[command(flatten)]
    removal: RemovalArgs,
    /// Show what would be removed without touching anything
    #[arg(long)]
    dry_run: bool,
    /// Skip the manifest backup
    #[arg(long)]
    no_backup: bool,
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gearbox=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let ctx = build_context(cli.root)?;

    let code = match cli.command {
        Commands::Install(args) => run_install(&ctx, args)?,
        Commands::Uninstall(args) => run_uninstall(&ctx, args)?,
        Commands::UninstallPlan {
            removal,
            safety,
            format,
        } => run_uninstall_plan(&ctx, &removal, safety, format)?,
        Commands::List { format } => run_list(&ctx, format)?,
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn build_context(root: Option<PathBuf>) -> Result<GearboxContext> {
    debug!(root = ?root, "Building context");
    let mut builder = GearboxContextBuilder::new();
    if let Some(root) = root {
        builder = builder.with_root(&root);
    }
    Ok(builder.build()?)
}

fn run_install(ctx: &GearboxContext, args: InstallArgs) -> Result<i32> {
    let mut request = ctx
        .install_request(&args.names)
        .with_dry_run(args.dry_run)
        .with_options(BuildOptions {
            skip_deps: args.skip_deps,
            force: args.force,
            run_tests: args.run_tests,
            verbose: args.verbose,
            dry_run: args.dry_run,
        });
    if let Some(profile) = args.build_type {
        request = request.with_profile(profile);
    }
    if let Some(jobs) = args.jobs {
        request = request.with_max_parallel(jobs);
    }

    let orchestrator = ctx.install_orchestrator();
    let (report, code) = match orchestrator.install(&request) {
        Ok(report) => (report, 0),
        Err(GearboxError::InstallFailed { report, .. }) => (*report, 1),
        Err(e) => return Err(e.into()),
    };

    match args.format {
        OutputFormat::Table => print_install_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(code)
}

fn print_install_table(report: &InstallReport) {
    let plan = &report.plan;
    println!("Build type: {}  Jobs: {}", plan.profile, plan.parallelism);
    for (bundle, tools) in &plan.bundles {
        println!("Bundle '{}': {}", bundle, tools.join(", "));
    }

    if report.dry_run {
        println!();
        println!("  {:<20} {:<10} Flag", "Tool", "Language");
        println!("  {}", "-".repeat(45));
        for tool in &plan.tools {
            let note = if tool.fell_back {
                format!(" (fallback to {})", tool.profile)
            } else {
                String::new()
            };
            println!(
                "  {:<20} {:<10} {}{}",
                truncate(&tool.name, 20),
                tool.language,
                tool.flag,
                note
            );
        }
        println!();
        println!("Dry run: {} tool(s) would be installed", plan.tools.len());
        return;
    }

    println!();
    for result in &report.results {
        if result.success {
            println!(
                "✓ {:<20} {:>6.1}s",
                result.tool,
                result.duration.as_secs_f64()
            );
        } else {
            println!(
                "✗ {:<20} {}",
                result.tool,
                result.error.as_deref().unwrap_or("failed")
            );
        }
    }

    println!();
    println!("{}", install_summary(report));
}

/// Closing line of an install run. Build time is summed across jobs.
fn install_summary(report: &InstallReport) -> String {
    let installed = report.succeeded().count();
    let build_time = report.total_duration().as_secs_f64();
    let failed = report.failed_names();
    if failed.is_empty() {
        format!("Installed {installed} tool(s), {build_time:.1}s of build time")
    } else {
        format!(
            "Installed {installed} of {} tool(s), {build_time:.1}s of build time; failed: {}",
            report.results.len(),
            failed.join(", ")
        )
    }
}

fn run_uninstall(ctx: &GearboxContext, args: UninstallArgs) -> Result<i32> {
    let plan = ctx
        .removal_planner()
        .plan_removal(&args.removal.names, &args.removal.options())?;
    let validation = validate_plan(&plan, ctx.settings().safety_level);

    let mut prompt = RemovalPrompt::new(args.yes);
    prompt.show_plan(&plan, &validation)?;

    if plan.is_empty() {
        return Ok(exit_code_for_kept(&plan));
    }
    if !args.dry_run && !prompt.confirm(&plan, &validation)? {
        println!("Uninstall cancelled.");
        return Ok(1);
    }

    let uninstaller = ctx.uninstaller();
    let options = ExecuteOptions {
        dry_run: args.dry_run,
        backup: ctx.settings().backup_before_uninstall && !args.no_backup,
    };
    let result = ctx
        .removal_executor(&uninstaller)
        .execute_plan(&plan, &options)?;
    prompt.show_result(&result)?;

    if !result.is_success() {
        eprintln!("Failed: {}", result.failed_names().join(", "));
        return Ok(1);
    }
    Ok(exit_code_for_kept(&plan))
}

fn run_uninstall_plan(
    ctx: &GearboxContext,
    removal: &RemovalArgs,
    safety: Option<SafetyLevel>,
    format: OutputFormat,
) -> Result<i32> {
    let plan = ctx
        .removal_planner()
        .plan_removal(&removal.names, &removal.options())?;
    let level = safety.unwrap_or(ctx.settings().safety_level);
    let validation = validate_plan(&plan, level);

    match format {
        OutputFormat::Table => {
            RemovalPrompt::new(true).show_plan(&plan, &validation)?;
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "safety_level": level,
                "plan": plan,
                "validation": validation,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(exit_code_for_kept(&plan))
}

/// Non-zero when any requested target is being kept, naming them on stderr.
fn exit_code_for_kept(plan: &RemovalPlan) -> i32 {
    if plan.to_keep.is_empty() {
        return 0;
    }
    let kept: Vec<&str> = plan.to_keep.iter().map(|k| k.target.as_str()).collect();
    eprintln!("Kept: {}", kept.join(", "));
    1
}

fn run_list(ctx: &GearboxContext, format: OutputFormat) -> Result<i32> {
    let records = ctx.manifest().list()?;
    match format {
        OutputFormat::Table => print_records_table(&records),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
    }
    Ok(0)
}

fn print_records_table(records: &[InstallationRecord]) {
    if records.is_empty() {
        println!("No tools tracked.");
        println!("Install one with: gearbox install <name>");
        return;
    }

    println!(
        "  {:<20} {:<26} {:<12} Installed",
        "Name", "Method", "Version"
    );
    println!("  {}", "-".repeat(75));
    for record in records {
        println!(
            "  {:<20} {:<26} {:<12} {}",
            truncate(&record.name, 20),
            record.method,
            truncate(&record.version, 12),
            record.installed_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
