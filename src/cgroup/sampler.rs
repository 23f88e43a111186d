//! Two-point CPU usage measurement for a cgroup.
//!
//! A measurement reads two cumulative counters at the start and at the end of an
//! interval:
//!
//! - host-wide CPU time, the sum of the aggregate `cpu` line of `/proc/stat`, in clock ticks;
//! - cgroup CPU time, `cpuacct.usage`, in nanoseconds.
//!
//! After converting the host delta to nanoseconds, usage is
//!
//! ```text
//! usage = cgroup_delta / host_delta * total_cores * 100
//! ```
//!
//! i.e. percent of one core, so a cgroup saturating two cores reports `200.0`.
//! Each measurement is independent; nothing is carried over between calls.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::clock;
use crate::fsutil::{self, ReadError};

use super::limits::CpuLimits;
use super::paths::CgroupPaths;
use super::stats::{CpuStat, SystemCpuTime};

/// Smallest limited core count treated as resolved.
const MIN_LIMITED_CORES: f64 = 0.01;

/// Host deltas at or below this many nanoseconds report zero usage.
const MIN_SYSTEM_DELTA_NANOS: f64 = 1.0;

const THROTTLED_KEY: &str = "nr_throttled";

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("no cpu clock tick")]
    NoClockTick,
    #[error("can't get core count")]
    NoCoreCount,
    #[error("can't get limited core count")]
    NoLimitedCoreCount,
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Cumulative counters read back-to-back at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuSample {
    /// Host-wide CPU time in clock ticks.
    pub system_ticks: u64,
    /// Cgroup CPU time in nanoseconds.
    pub cgroup_nanos: u64,
}

/// Computes usage between two samples, in percent of one core.
///
/// Returns `0.0` when the host delta is too small to divide by, e.g. for two
/// samples within the same clock tick. Counters that went backwards count as
/// no progress.
pub fn compute_usage(baseline: CpuSample, current: CpuSample, limits: &CpuLimits) -> f64 {
    let cpu_delta = current.cgroup_nanos.saturating_sub(baseline.cgroup_nanos) as f64;
    let system_delta = current.system_ticks.saturating_sub(baseline.system_ticks) as f64
        * clock::tick_to_nanos(limits.clock_tick_hz());

    if system_delta <= MIN_SYSTEM_DELTA_NANOS {
        return 0.0;
    }
    (cpu_delta / system_delta) * limits.total_cores() as f64 * 100.0
}

#[derive(Debug)]
struct CpuFiles {
    proc_stat: PathBuf,
    cpuacct_usage: PathBuf,
    cpu_stat: PathBuf,
}

impl CpuFiles {
    fn read_sample(&self) -> Result<CpuSample, ReadError> {
        let system = fsutil::read_file(&self.proc_stat, SystemCpuTime::from_reader)?;
        let cgroup_nanos = fsutil::read_unsigned_counter(&self.cpuacct_usage)?;
        Ok(CpuSample {
            system_ticks: system.total_ticks,
            cgroup_nanos,
        })
    }

    fn read_throttled(&self) -> Result<u64, ReadError> {
        let counters = fsutil::read_keyed_counters(&self.cpu_stat)?;
        Ok(counters.get(THROTTLED_KEY).unwrap_or(0))
    }
}

/// Samples the CPU usage of a cgroup.
///
/// Cloning is cheap; clones share the same file set and limits.
#[derive(Debug, Clone)]
pub struct CpuSampler {
    files: Arc<CpuFiles>,
    limits: CpuLimits,
}

impl CpuSampler {
    pub fn new(paths: &CgroupPaths, limits: CpuLimits) -> Self {
        Self {
            files: Arc::new(CpuFiles {
                proc_stat: paths.proc_stat.clone(),
                cpuacct_usage: paths.cpuacct_usage.clone(),
                cpu_stat: paths.cpu_stat.clone(),
            }),
            limits,
        }
    }

    /// The startup facts this sampler checks and scales by.
    pub fn limits(&self) -> &CpuLimits {
        &self.limits
    }

    fn check_limits(&self) -> Result<(), SampleError> {
        if self.limits.clock_tick_hz() == 0 {
            return Err(SampleError::NoClockTick);
        }
        if self.limits.total_cores() == 0 {
            return Err(SampleError::NoCoreCount);
        }
        if self.limits.limited_cores() < MIN_LIMITED_CORES {
            return Err(SampleError::NoLimitedCoreCount);
        }
        Ok(())
    }

    /// Checks the startup facts and captures the baseline.
    ///
    /// Nothing is read if a fact is unresolved.
    ///
    /// # Errors
    ///
    /// - [`SampleError::NoClockTick`], [`SampleError::NoCoreCount`] or
    ///   [`SampleError::NoLimitedCoreCount`] if the corresponding fact is unresolved.
    /// - [`SampleError::Read`] if a counter cannot be read.
    pub fn begin(&self) -> Result<PendingSample, SampleError> {
        self.check_limits()?;
        let baseline = self.files.read_sample()?;
        log::trace!("captured cpu baseline: {baseline:?}");
        Ok(PendingSample {
            files: Arc::clone(&self.files),
            limits: self.limits,
            baseline,
        })
    }

    /// Measures CPU usage over `interval`.
    ///
    /// The baseline is captured before the first `.await`. Dropping the future
    /// cancels the measurement, and it composes with [`tokio::time::timeout`].
    pub async fn sample(&self, interval: Duration) -> Result<CpuStat, SampleError> {
        let pending = self.begin()?;
        pending.complete(interval).await
    }

    /// Measures CPU usage over `interval` and reports the result to `on_complete`.
    ///
    /// Unresolved facts and baseline failures are reported synchronously, before
    /// this function returns, and `None` is returned. Otherwise the rest of the
    /// measurement runs on a spawned task and `on_complete` is invoked from it; the
    /// returned handle may be ignored, awaited, or aborted (in which case
    /// `on_complete` is never invoked).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn sample_cpu_usage<F>(&self, interval: Duration, on_complete: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce(Result<CpuStat, SampleError>) + Send + 'static,
    {
        let pending = match self.begin() {
            Ok(pending) => pending,
            Err(err) => {
                on_complete(Err(err));
                return None;
            }
        };

        Some(tokio::spawn(async move {
            on_complete(pending.complete(interval).await);
        }))
    }
}

/// A measurement whose baseline has been captured.
#[derive(Debug)]
pub struct PendingSample {
    files: Arc<CpuFiles>,
    limits: CpuLimits,
    baseline: CpuSample,
}

impl PendingSample {
    pub fn baseline(&self) -> CpuSample {
        self.baseline
    }

    /// Waits for `interval`, reads the counters again, and computes the result.
    ///
    /// The throttled count is the raw cumulative value at the end of the interval.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::Read`] if any read fails; no partial result is produced.
    pub async fn complete(self, interval: Duration) -> Result<CpuStat, SampleError> {
        tokio::time::sleep(interval).await;

        let current = self.files.read_sample()?;
        let throttled = self.files.read_throttled()?;
        let usage = compute_usage(self.baseline, current, &self.limits);
        log::trace!("cpu sample: baseline={:?}, current={current:?}, usage={usage}", self.baseline);

        Ok(CpuStat {
            limited_cores: self.limits.limited_cores(),
            usage,
            throttled,
        })
    }
}
