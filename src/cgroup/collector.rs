use std::path::PathBuf;

use crate::ResultOkLogExt;
use crate::fsutil::{self, ReadError};

use super::paths::CgroupPaths;
use super::stats::{
    DefaultRoute, DiskStat, HostMemInfo, KeyValueStat, MemStat, MemoryCounters, NetworkStat,
    StatsEntry,
};

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("default network interface not found")]
    NoDefaultInterface,
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Finds the interface carrying the IPv4 default route.
///
/// # Errors
///
/// Returns a [`ReadError`] if the routing table cannot be read.
pub fn default_interface(paths: &CgroupPaths) -> Result<Option<String>, ReadError> {
    let route = fsutil::read_file(&paths.proc_net_route, DefaultRoute::from_reader)?;
    Ok(route.map(|route| route.interface))
}

/// Reads memory, block I/O, and network statistics of the container.
///
/// Unlike CPU usage these are point-in-time reads; each call reads its files once.
#[derive(Debug)]
pub struct Collector {
    paths: CgroupPaths,
    /// blkio file chosen by the first call that saw activity.
    disk_acct_file: Option<PathBuf>,
    /// Statistics directory of the default interface.
    net_statistics: Option<PathBuf>,
}

impl Collector {
    /// Creates a collector for the given interface, or without network stats if `None`.
    pub fn new(paths: CgroupPaths, interface: Option<&str>) -> Self {
        let net_statistics = interface.map(|iface| paths.net_statistics(iface));
        Self {
            paths,
            disk_acct_file: None,
            net_statistics,
        }
    }

    /// Creates a collector, discovering the default interface from the routing table.
    pub fn discover(paths: CgroupPaths) -> Self {
        let interface = default_interface(&paths)
            .ok_log("failed to read routing table")
            .flatten();
        match &interface {
            Some(iface) => log::debug!("default network interface: {iface}"),
            None => log::warn!("no default network interface, network stats are unavailable"),
        }
        Self::new(paths, interface.as_deref())
    }

    /// Reads memory usage from `memory.stat`, bounded by host memory.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Read`] if either file cannot be read, or if
    /// `memory.stat` lacks `hierarchical_memory_limit`.
    pub fn memory_stat(&self) -> Result<MemStat, CollectError> {
        let counters = fsutil::read_file(&self.paths.memory_stat, MemoryCounters::from_reader)?;
        let host = fsutil::read_file(&self.paths.proc_meminfo, HostMemInfo::from_reader)?;
        MemStat::from_parts(&counters, &host).map_err(|source| {
            CollectError::Read(ReadError::Parse {
                path: self.paths.memory_stat.clone(),
                source,
            })
        })
    }

    /// Reads block I/O byte counters.
    ///
    /// Until one of the candidate blkio files reports activity, every candidate
    /// is tried and zeros are returned. The first active file is used from then on.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Read`] only once a file has been chosen and reading it fails.
    pub fn disk_stat(&mut self) -> Result<DiskStat, CollectError> {
        if let Some(path) = &self.disk_acct_file {
            return Ok(fsutil::read_file(path, DiskStat::from_reader)?);
        }

        for path in &self.paths.disk_acct_files {
            match fsutil::read_file(path, DiskStat::from_reader) {
                Ok(stat) if stat.has_activity() => {
                    log::debug!("using `{}` for disk stats", path.display());
                    self.disk_acct_file = Some(path.clone());
                    return Ok(stat);
                }
                Ok(_) => {}
                Err(err) => log::trace!("skipping disk accounting file: {err}"),
            }
        }

        Ok(DiskStat::default())
    }

    /// Reads the byte counters of the default interface.
    ///
    /// # Errors
    ///
    /// - [`CollectError::NoDefaultInterface`] if no interface is known.
    /// - [`CollectError::Read`] if a counter cannot be read.
    pub fn network_stat(&self) -> Result<NetworkStat, CollectError> {
        let dir = self
            .net_statistics
            .as_ref()
            .ok_or(CollectError::NoDefaultInterface)?;
        let rx_bytes = fsutil::read_unsigned_counter(dir.join("rx_bytes"))?;
        let tx_bytes = fsutil::read_unsigned_counter(dir.join("tx_bytes"))?;
        Ok(NetworkStat { rx_bytes, tx_bytes })
    }

    /// Collects memory, disk, and network stats. Failures are logged and left as `None`.
    ///
    /// The CPU section is left empty for the caller to fill in.
    pub fn collect(&mut self, timestamp: u64) -> StatsEntry {
        StatsEntry {
            timestamp,
            cpu: None,
            memory: self.memory_stat().ok_log("failed reading memory stats"),
            disk: self.disk_stat().ok_log("failed reading disk stats"),
            network: self.network_stat().ok_log("failed reading network stats"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    struct FakeHost {
        root: tempfile::TempDir,
        paths: CgroupPaths,
    }

    impl FakeHost {
        fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            let paths = CgroupPaths::new(root.path());
            Self { root, paths }
        }

        fn write(&self, path: &Path, contents: &str) {
            assert!(path.starts_with(self.root.path()));
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }
    }

    #[test]
    fn test_memory_stat() {
        let host = FakeHost::new();
        host.write(
            &host.paths.memory_stat,
            "hierarchical_memory_limit 1073741824\ntotal_rss 1000\ntotal_mapped_file 24\ntotal_cache 7\n",
        );
        host.write(&host.paths.proc_meminfo, "MemTotal:       4096 kB\n");

        let collector = Collector::new(host.paths.clone(), None);
        let mem = collector.memory_stat().unwrap();
        assert_eq!(mem.total, 4096 * 1024);
        assert_eq!(mem.rss, 1024);
        assert_eq!(mem.cached, 7);
    }

    #[test]
    fn test_memory_stat_missing_limit() {
        let host = FakeHost::new();
        host.write(&host.paths.memory_stat, "total_rss 1000\n");
        host.write(&host.paths.proc_meminfo, "MemTotal:       4096 kB\n");

        let collector = Collector::new(host.paths.clone(), None);
        let err = collector.memory_stat().unwrap_err();
        match err {
            CollectError::Read(ReadError::Parse { path, .. }) => {
                assert_eq!(path, host.paths.memory_stat)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_disk_stat_discovers_active_file() {
        let host = FakeHost::new();
        let [recursive, throttle] = [
            host.paths.disk_acct_files[0].clone(),
            host.paths.disk_acct_files[1].clone(),
        ];
        host.write(&recursive, "Total 0\n");
        host.write(&throttle, "8:0 Read 10\n8:0 Write 20\n");

        let mut collector = Collector::new(host.paths.clone(), None);
        let stat = collector.disk_stat().unwrap();
        assert_eq!(stat, DiskStat { read: 10, write: 20 });

        // The chosen file sticks even once the other one shows activity.
        host.write(&recursive, "8:0 Read 99\n");
        host.write(&throttle, "8:0 Read 11\n8:0 Write 21\n");
        let stat = collector.disk_stat().unwrap();
        assert_eq!(stat, DiskStat { read: 11, write: 21 });
    }

    #[test]
    fn test_disk_stat_without_activity_is_zero() {
        let host = FakeHost::new();
        let mut collector = Collector::new(host.paths.clone(), None);
        assert_eq!(collector.disk_stat().unwrap(), DiskStat::default());
    }

    #[test]
    fn test_disk_stat_chosen_file_errors_surface() {
        let host = FakeHost::new();
        let recursive = host.paths.disk_acct_files[0].clone();
        host.write(&recursive, "8:0 Read 1\n");

        let mut collector = Collector::new(host.paths.clone(), None);
        collector.disk_stat().unwrap();

        std::fs::remove_file(&recursive).unwrap();
        let err = collector.disk_stat().unwrap_err();
        assert!(matches!(err, CollectError::Read(ReadError::NotFound { .. })));
    }

    #[test]
    fn test_network_stat_of_default_interface() {
        let host = FakeHost::new();
        host.write(
            &host.paths.proc_net_route,
            "Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT\n\
             eth0\t00000000\t010011AC\t0003\t0\t0\t0\t00000000\t0\t0\t0\n",
        );
        let stats = host.paths.net_statistics("eth0");
        host.write(&stats.join("rx_bytes"), "1234\n");
        host.write(&stats.join("tx_bytes"), "5678\n");

        let collector = Collector::discover(host.paths.clone());
        let stat = collector.network_stat().unwrap();
        assert_eq!(
            stat,
            NetworkStat {
                rx_bytes: 1234,
                tx_bytes: 5678
            }
        );
    }

    #[test]
    fn test_network_stat_without_default_interface() {
        let host = FakeHost::new();
        let collector = Collector::discover(host.paths.clone());
        let err = collector.network_stat().unwrap_err();
        assert!(matches!(err, CollectError::NoDefaultInterface));
    }

    #[test]
    fn test_collect_leaves_failed_sections_empty() {
        let host = FakeHost::new();
        let mut collector = Collector::new(host.paths.clone(), None);

        let entry = collector.collect(1_700_000_000);
        assert_eq!(entry.timestamp, 1_700_000_000);
        assert_eq!(entry.cpu, None);
        assert_eq!(entry.memory, None);
        assert_eq!(entry.disk, Some(DiskStat::default()));
        assert_eq!(entry.network, None);
    }
}
