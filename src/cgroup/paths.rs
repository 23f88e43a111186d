use std::path::{Path, PathBuf};

/// Candidate blkio files, in order of preference.
const DISK_ACCT_FILES: [&str; 2] = [
    "sys/fs/cgroup/blkio/blkio.io_service_bytes_recursive",
    "sys/fs/cgroup/blkio/blkio.throttle.io_service_bytes",
];

/// Locations of every cgroup v1 and procfs pseudo-file read by this crate.
///
/// All paths are derived from a single root so that a host filesystem mounted
/// elsewhere (or a fake tree in tests) can be monitored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgroupPaths {
    /// Host-wide CPU time (`/proc/stat`).
    pub proc_stat: PathBuf,
    /// Host memory information (`/proc/meminfo`).
    pub proc_meminfo: PathBuf,
    /// IPv4 routing table (`/proc/net/route`).
    pub proc_net_route: PathBuf,
    /// Cumulative cgroup CPU time in nanoseconds.
    pub cpuacct_usage: PathBuf,
    /// Cumulative cgroup CPU time per core.
    pub cpuacct_usage_percpu: PathBuf,
    /// CFS bandwidth counters.
    pub cpu_stat: PathBuf,
    pub cpu_cfs_quota: PathBuf,
    pub cpu_cfs_period: PathBuf,
    pub cpuset_cpus: PathBuf,
    pub memory_stat: PathBuf,
    /// blkio service-bytes files, tried in order.
    pub disk_acct_files: Vec<PathBuf>,
    /// Directory holding one subdirectory per network interface.
    pub sys_class_net: PathBuf,
}

impl CgroupPaths {
    /// Derives all paths from `root`, which is `/` on an unconfined host.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            proc_stat: root.join("proc/stat"),
            proc_meminfo: root.join("proc/meminfo"),
            proc_net_route: root.join("proc/net/route"),
            cpuacct_usage: root.join("sys/fs/cgroup/cpuacct/cpuacct.usage"),
            cpuacct_usage_percpu: root.join("sys/fs/cgroup/cpuacct/cpuacct.usage_percpu"),
            cpu_stat: root.join("sys/fs/cgroup/cpu/cpu.stat"),
            cpu_cfs_quota: root.join("sys/fs/cgroup/cpu/cpu.cfs_quota_us"),
            cpu_cfs_period: root.join("sys/fs/cgroup/cpu/cpu.cfs_period_us"),
            cpuset_cpus: root.join("sys/fs/cgroup/cpuset/cpuset.cpus"),
            memory_stat: root.join("sys/fs/cgroup/memory/memory.stat"),
            disk_acct_files: DISK_ACCT_FILES.iter().map(|f| root.join(f)).collect(),
            sys_class_net: root.join("sys/class/net"),
        }
    }

    /// Returns the statistics directory of a network interface.
    pub fn net_statistics(&self, interface: &str) -> PathBuf {
        self.sys_class_net.join(interface).join("statistics")
    }
}

impl Default for CgroupPaths {
    fn default() -> Self {
        Self::new("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let paths = CgroupPaths::default();
        assert_eq!(paths.proc_stat, PathBuf::from("/proc/stat"));
        assert_eq!(
            paths.cpuacct_usage,
            PathBuf::from("/sys/fs/cgroup/cpuacct/cpuacct.usage")
        );
        assert_eq!(
            paths.cpu_cfs_quota,
            PathBuf::from("/sys/fs/cgroup/cpu/cpu.cfs_quota_us")
        );
        assert_eq!(
            paths.disk_acct_files[0],
            PathBuf::from("/sys/fs/cgroup/blkio/blkio.io_service_bytes_recursive")
        );
    }

    #[test]
    fn test_rooted_paths() {
        let paths = CgroupPaths::new("/rootfs");
        assert_eq!(
            paths.cpuset_cpus,
            PathBuf::from("/rootfs/sys/fs/cgroup/cpuset/cpuset.cpus")
        );
        assert_eq!(
            paths.net_statistics("eth0"),
            PathBuf::from("/rootfs/sys/class/net/eth0/statistics")
        );
    }
}
