//! Resolution of how many cores a cgroup can see and how many it may use.
//!
//! The number of usable cores comes from exactly one of two cgroup v1 schemes:
//!
//! 1. **CFS bandwidth**: `cpu.cfs_quota_us / cpu.cfs_period_us`, the fraction of
//!    CPU time granted per period. A quota of `-1` means no quota is set.
//! 2. **cpuset**: the number of cores listed in `cpuset.cpus`, used only when
//!    no quota is set.
//!
//! These facts are resolved once at startup into [`CpuLimits`].

use crate::ResultOkLogExt;
use crate::clock;
use crate::fsutil::{self, ReadError};

use super::paths::CgroupPaths;
use super::stats::{CpuList, PerCpuUsage};

/// Value of `cpu.cfs_quota_us` when no quota is set.
pub const UNLIMITED_QUOTA: i64 = -1;

#[derive(Debug, thiserror::Error)]
pub enum LimitError {
    #[error("invalid CFS configuration: quota {quota} with period {period}")]
    InvalidPeriod { quota: i64, period: u64 },
    #[error("invalid CFS quota {quota}")]
    InvalidQuota { quota: i64 },
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Converts a CFS quota and period (both in microseconds) into fractional cores.
///
/// # Errors
///
/// - [`LimitError::InvalidQuota`] for a negative quota other than [`UNLIMITED_QUOTA`].
/// - [`LimitError::InvalidPeriod`] for a zero period.
pub fn cores_from_quota(quota: i64, period: u64) -> Result<f64, LimitError> {
    if quota < 0 {
        return Err(LimitError::InvalidQuota { quota });
    }
    if period == 0 {
        return Err(LimitError::InvalidPeriod { quota, period });
    }
    Ok(quota as f64 / period as f64)
}

/// Resolves the number of cores the cgroup may use.
///
/// The period file is only read when a quota is set, and the cpuset file only
/// when it is not.
///
/// # Errors
///
/// Returns a [`LimitError`] if a file cannot be read or parsed, or if the CFS
/// configuration is invalid. A malformed cpuset list aborts the resolution.
pub fn resolve_limited_core_count(paths: &CgroupPaths) -> Result<f64, LimitError> {
    let quota = fsutil::read_signed_counter(&paths.cpu_cfs_quota)?;
    if quota == UNLIMITED_QUOTA {
        log::debug!("no CFS quota set, counting cores in cpuset");
        return Ok(resolve_cpuset_core_count(paths)? as f64);
    }

    let period = fsutil::read_unsigned_counter(&paths.cpu_cfs_period)?;
    cores_from_quota(quota, period)
}

/// Counts the cores listed in `cpuset.cpus`.
pub fn resolve_cpuset_core_count(paths: &CgroupPaths) -> Result<u64, ReadError> {
    Ok(fsutil::read_stat::<CpuList>(&paths.cpuset_cpus)?.core_count)
}

/// Counts the per-core slots of `cpuacct.usage_percpu`.
pub fn resolve_total_core_count(paths: &CgroupPaths) -> Result<u64, ReadError> {
    Ok(fsutil::read_stat::<PerCpuUsage>(&paths.cpuacct_usage_percpu)?.core_count)
}

/// Process-wide CPU facts, resolved once and shared read-only by every sampler.
///
/// A zero field means the fact could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CpuLimits {
    clock_tick_hz: u64,
    total_cores: u64,
    limited_cores: f64,
}

impl CpuLimits {
    pub fn new(clock_tick_hz: u64, total_cores: u64, limited_cores: f64) -> Self {
        Self {
            clock_tick_hz,
            total_cores,
            limited_cores,
        }
    }

    /// Resolves all facts from the host.
    ///
    /// Failures are logged and leave the affected fact at zero, which makes
    /// every later sample fail with an error naming the missing fact.
    pub fn resolve(paths: &CgroupPaths) -> Self {
        let total_cores = resolve_total_core_count(paths)
            .ok_log("failed to resolve core count")
            .unwrap_or(0);
        let limited_cores = resolve_limited_core_count(paths)
            .ok_log("failed to resolve limited core count")
            .unwrap_or(0.0);
        let clock_tick_hz = clock::clock_tick_hz()
            .ok_log("failed to resolve clock tick rate")
            .unwrap_or(0);

        let limits = Self::new(clock_tick_hz, total_cores, limited_cores);
        log::info!(
            "resolved cpu limits: clock_tick_hz={}, total_cores={}, limited_cores={:.2}",
            limits.clock_tick_hz,
            limits.total_cores,
            limits.limited_cores
        );
        limits
    }

    /// Kernel clock ticks per second.
    pub fn clock_tick_hz(&self) -> u64 {
        self.clock_tick_hz
    }

    /// Number of per-core accounting slots visible to the cgroup.
    pub fn total_cores(&self) -> u64 {
        self.total_cores
    }

    /// Number of cores the cgroup may use.
    pub fn limited_cores(&self) -> f64 {
        self.limited_cores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroup::stats::StatParseError;
    use std::path::Path;

    fn write(root: &Path, path: &Path, contents: &str) {
        assert!(path.starts_with(root));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_cores_from_quota() {
        assert_eq!(cores_from_quota(150_000, 100_000).unwrap(), 1.5);
        assert_eq!(cores_from_quota(50_000, 100_000).unwrap(), 0.5);
        assert_eq!(cores_from_quota(0, 100_000).unwrap(), 0.0);
    }

    #[test]
    fn test_cores_from_quota_zero_period() {
        let err = cores_from_quota(150_000, 0).unwrap_err();
        assert!(matches!(
            err,
            LimitError::InvalidPeriod {
                quota: 150_000,
                period: 0
            }
        ));
    }

    #[test]
    fn test_cores_from_quota_negative() {
        let err = cores_from_quota(-2, 100_000).unwrap_err();
        assert!(matches!(err, LimitError::InvalidQuota { quota: -2 }));
    }

    #[test]
    fn test_resolve_from_quota_and_period() {
        let root = tempfile::tempdir().unwrap();
        let paths = CgroupPaths::new(root.path());
        write(root.path(), &paths.cpu_cfs_quota, "150000\n");
        write(root.path(), &paths.cpu_cfs_period, "100000\n");

        assert_eq!(resolve_limited_core_count(&paths).unwrap(), 1.5);
    }

    #[test]
    fn test_resolve_unlimited_quota_uses_cpuset_without_period() {
        let root = tempfile::tempdir().unwrap();
        let paths = CgroupPaths::new(root.path());
        write(root.path(), &paths.cpu_cfs_quota, "-1\n");
        write(root.path(), &paths.cpuset_cpus, "0,2,4-6\n");
        assert!(!paths.cpu_cfs_period.exists());

        assert_eq!(resolve_limited_core_count(&paths).unwrap(), 5.0);
    }

    #[test]
    fn test_resolve_malformed_cpuset() {
        let root = tempfile::tempdir().unwrap();
        let paths = CgroupPaths::new(root.path());
        write(root.path(), &paths.cpu_cfs_quota, "-1\n");
        write(root.path(), &paths.cpuset_cpus, "0-1-2\n");

        let err = resolve_limited_core_count(&paths).unwrap_err();
        assert!(matches!(
            err,
            LimitError::Read(ReadError::Parse {
                source: StatParseError::InvalidCpuList { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_resolve_missing_quota_file() {
        let root = tempfile::tempdir().unwrap();
        let paths = CgroupPaths::new(root.path());

        let err = resolve_limited_core_count(&paths).unwrap_err();
        assert!(matches!(err, LimitError::Read(ReadError::NotFound { .. })));
    }

    #[test]
    fn test_resolve_zero_period_file() {
        let root = tempfile::tempdir().unwrap();
        let paths = CgroupPaths::new(root.path());
        write(root.path(), &paths.cpu_cfs_quota, "200000\n");
        write(root.path(), &paths.cpu_cfs_period, "0\n");

        let err = resolve_limited_core_count(&paths).unwrap_err();
        assert!(matches!(err, LimitError::InvalidPeriod { .. }));
    }

    #[test]
    fn test_resolve_total_core_count() {
        let root = tempfile::tempdir().unwrap();
        let paths = CgroupPaths::new(root.path());
        write(
            root.path(),
            &paths.cpuacct_usage_percpu,
            "2938420 0 1948210 49201 \n",
        );

        assert_eq!(resolve_total_core_count(&paths).unwrap(), 4);
    }

    #[test]
    fn test_resolve_leaves_unresolved_facts_at_zero() {
        let root = tempfile::tempdir().unwrap();
        let paths = CgroupPaths::new(root.path());

        let limits = CpuLimits::resolve(&paths);
        assert_eq!(limits.total_cores(), 0);
        assert_eq!(limits.limited_cores(), 0.0);
    }
}
