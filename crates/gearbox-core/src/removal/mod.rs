//! Uninstall planning and execution.
//!
//! Planning is pure over the manifest snapshot it loads. Execution runs the
//! plan's actions one at a time so dependency bookkeeping in the manifest
//! never sees interleaved updates.

pub mod executor;
pub mod plan;
pub mod planner;
pub mod uninstall;
pub mod validate;

pub use executor::{ExecuteOptions, FailedRemoval, RemovalExecutor, RemovalResult};
pub use plan::{
    DependencyAction, DependencyDecision, KeepEntry, PlanWarning, RemovalAction, RemovalMethod,
    RemovalOptions, RemovalPlan, RemovalSummary, WarningLevel,
};
pub use planner::RemovalPlanner;
pub use uninstall::{CommandUninstaller, SystemPackageManager, Uninstaller};
pub use validate::validate_plan;
