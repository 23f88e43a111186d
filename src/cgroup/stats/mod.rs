//! This module provides core types and parsers for the resource usage statistics of a container.
//!
//! Each submodule understands one family of cgroup v1 or procfs pseudo-files. The
//! [`StatsEntry`] struct bundles the results of one monitoring cycle.
//!
//! # Main types
//!
//! - [`CpuStat`]: Result of a two-point CPU measurement (see [`crate::cgroup::CpuSampler`]).
//! - [`MemStat`]: Memory usage bounded by the cgroup limit and host memory.
//! - [`DiskStat`]: Block I/O bytes read and written.
//! - [`NetworkStat`]: Bytes received and transmitted on the default interface.
//!
//! # Parsing
//!
//! Scalar files implement [`SingleLineStat`], `key value` files implement
//! [`KeyValueStat`] or are read into [`KeyedCounters`]; everything else has an
//! inherent `from_reader`.

mod cpu;
mod error;
mod io;
mod memory;
mod net;
mod parser;

pub use cpu::{CpuList, CpuStat, PerCpuUsage, SystemCpuTime, parse_cpu_list};
pub use error::StatParseError;
pub use io::DiskStat;
pub use memory::{HostMemInfo, MemStat, MemoryCounters};
pub use net::{DefaultRoute, NetworkStat};
pub use parser::{KeyValueStat, KeyedCounters, SingleLineStat};

/// All statistics collected in one monitoring cycle.
///
/// A section is `None` when its producer failed during that cycle.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StatsEntry {
    /// Timestamp (in UNIX epoch seconds) at which the cycle started.
    pub timestamp: u64,
    pub cpu: Option<CpuStat>,
    pub memory: Option<MemStat>,
    pub disk: Option<DiskStat>,
    pub network: Option<NetworkStat>,
}
