//! Resource monitoring of a container through its cgroup v1 pseudo-files.
//!
//! The process runs inside the cgroup it observes. CPU usage is measured by
//! comparing the cgroup's cumulative CPU time against host-wide CPU time over an
//! interval and normalizing it by the visible core count.
//!
//! # Key Components
//!
//! - [`CgroupPaths`]: locations of every pseudo-file read, derived from a root.
//! - [`CpuLimits`]: clock tick rate, visible cores, and usable cores, resolved once.
//! - [`CpuSampler`]: two-point CPU usage measurement.
//! - [`Collector`]: point-in-time memory, block I/O, and network stats.
//!
//! # Supported Stats
//!
//! The following files are read, if available:
//!
//! - `cpuacct.usage`, `cpuacct.usage_percpu`, and `/proc/stat`
//! - `cpu.stat`, `cpu.cfs_quota_us`, `cpu.cfs_period_us`, and `cpuset.cpus`
//! - `memory.stat` and `/proc/meminfo`
//! - `blkio.io_service_bytes_recursive` or `blkio.throttle.io_service_bytes`
//! - `/proc/net/route` and `/sys/class/net/<iface>/statistics`
//!
//! # Platform Requirements
//!
//! - Linux with the cgroup v1 `cpu`, `cpuacct`, `cpuset`, `memory`, and `blkio`
//!   controllers mounted under `/sys/fs/cgroup`.
mod collector;
mod limits;
mod paths;
mod sampler;
pub mod stats;

pub use collector::{CollectError, Collector, default_interface};
pub use limits::{
    CpuLimits, LimitError, UNLIMITED_QUOTA, cores_from_quota, resolve_cpuset_core_count,
    resolve_limited_core_count, resolve_total_core_count,
};
pub use paths::CgroupPaths;
pub use sampler::{CpuSample, CpuSampler, PendingSample, SampleError, compute_usage};
