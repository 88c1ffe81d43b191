//! Worker pool sizing.

use tracing::debug;

use crate::types::BuildProfile;

/// Upper bound for auto-detected parallelism.
pub const MAX_PARALLEL_JOBS: usize = 8;

/// Parallelism from CPU count and available memory.
///
/// Each job is assumed to need [`BuildProfile::estimated_job_memory_mb`].
/// Unknown memory leaves the CPU count as the only limit. The result is
/// clamped to `1..=MAX_PARALLEL_JOBS`.
pub fn compute_parallelism(
    cpus: usize,
    available_memory_mb: Option<u64>,
    profile: BuildProfile,
) -> usize {
    let by_cpu = cpus.max(1);
    let by_memory = available_memory_mb
        .map(|mb| usize::try_from(mb / profile.estimated_job_memory_mb()).unwrap_or(usize::MAX))
        .unwrap_or(by_cpu);
    by_cpu.min(by_memory).clamp(1, MAX_PARALLEL_JOBS)
}

/// Honour an explicit job count, or auto-detect when it is zero.
pub fn resolve_parallelism(requested: usize, profile: BuildProfile) -> usize {
    if requested > 0 {
        return requested;
    }
    let cpus = detect_cpus();
    let memory = detect_available_memory_mb();
    let jobs = compute_parallelism(cpus, memory, profile);
    debug!(cpus, ?memory, %profile, jobs, "Auto-detected parallelism");
    jobs
}

pub fn detect_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// `MemAvailable` from `/proc/meminfo`, in MiB. `None` off Linux.
pub fn detect_available_memory_mb() -> Option<u64> {
    let content = std::fs::read_to_string("/proc/meminfo").ok()?;
    parse_meminfo_available(&content)
}

fn parse_meminfo_available(content: &str) -> Option<u64> {
    content
        .lines()
        .find(|line| line.starts_with("MemAvailable:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb / 1024)
}
