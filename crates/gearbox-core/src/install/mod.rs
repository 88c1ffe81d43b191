//! Tool installation: planning, ordering and bounded-parallel execution.

pub mod action;
pub mod order;
pub mod orchestrator;
pub mod parallelism;

pub use action::{BuildAction, BuildOptions, BuildOutcome, ScriptBuildAction};
pub use orchestrator::{
    InstallLayout, InstallOrchestrator, InstallPlan, InstallReport, InstallRequest, InstallResult,
    PlannedInstall, sort_results,
};
pub use order::{LANGUAGE_PRIORITY, install_order, normalize_language};
pub use parallelism::{
    MAX_PARALLEL_JOBS, compute_parallelism, detect_available_memory_mb, detect_cpus,
    resolve_parallelism,
};
