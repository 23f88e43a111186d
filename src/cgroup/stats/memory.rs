//! This module provides parsing utilities for cgroup v1 memory statistics.
//!
//! A [`MemStat`] combines two sources:
//!
//! - **`memory.stat`** of the memory controller, parsed into [`MemoryCounters`].
//!   Only the hierarchical limits and the `total_*` counters (which include
//!   descendant cgroups) are used.
//! - **`/proc/meminfo`** of the host, parsed into [`HostMemInfo`], since a cgroup
//!   without a limit reports a limit far beyond the installed memory.
//!
//! # Examples
//!
//! ```rust
//! use contmetric::cgroup::stats::{HostMemInfo, KeyValueStat, MemStat, MemoryCounters};
//!
//! let stat = "total_rss 1048576\ntotal_mapped_file 4096\nhierarchical_memory_limit 9223372036854771712\n";
//! let counters = MemoryCounters::from_reader(&mut stat.as_bytes()).unwrap();
//! let host = HostMemInfo::from_reader(&mut "MemTotal:        2048 kB\n".as_bytes()).unwrap();
//!
//! let mem = MemStat::from_parts(&counters, &host).unwrap();
//! assert_eq!(mem.total, 2048 * 1024);
//! assert_eq!(mem.rss, 1048576 + 4096);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;
use std::sync::LazyLock;

use super::parser::parse_value;
use super::{KeyValueStat, StatParseError};

const MIB: u64 = 1024 * 1024;

/// Counters from the cgroup v1 `memory.stat` file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryCounters {
    /// Memory limit in bytes, considering the whole hierarchy.
    pub hierarchical_memory_limit: Option<u64>,
    /// Memory plus swap limit in bytes. Absent when swap accounting is disabled.
    pub hierarchical_memsw_limit: Option<u64>,
    pub total_cache: u64,
    pub total_rss: u64,
    pub total_mapped_file: u64,
    pub total_swap: u64,
}

impl MemoryCounters {
    fn set_hierarchical_memory_limit(&mut self, v: u64) {
        self.hierarchical_memory_limit = Some(v);
    }

    fn set_hierarchical_memsw_limit(&mut self, v: u64) {
        self.hierarchical_memsw_limit = Some(v);
    }

    fn set_total_cache(&mut self, v: u64) {
        self.total_cache = v;
    }

    fn set_total_rss(&mut self, v: u64) {
        self.total_rss = v;
    }

    fn set_total_mapped_file(&mut self, v: u64) {
        self.total_mapped_file = v;
    }

    fn set_total_swap(&mut self, v: u64) {
        self.total_swap = v;
    }
}

type Setter = fn(&mut MemoryCounters, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(6);

    m.insert(
        "hierarchical_memory_limit",
        MemoryCounters::set_hierarchical_memory_limit,
    );
    m.insert(
        "hierarchical_memsw_limit",
        MemoryCounters::set_hierarchical_memsw_limit,
    );
    m.insert("total_cache", MemoryCounters::set_total_cache);
    m.insert("total_rss", MemoryCounters::set_total_rss);
    m.insert("total_mapped_file", MemoryCounters::set_total_mapped_file);
    m.insert("total_swap", MemoryCounters::set_total_swap);

    m
});

impl KeyValueStat for MemoryCounters {
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}

/// Host memory facts from `/proc/meminfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostMemInfo {
    /// Installed memory in bytes.
    pub mem_total: u64,
}

impl HostMemInfo {
    /// Parses the `MemTotal:` line of `/proc/meminfo`.
    ///
    /// # Errors
    ///
    /// - [`StatParseError::InvalidValue`] if the value is not a number.
    /// - [`StatParseError::MissingField`] if there is no `MemTotal:` line.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            if let Some(rest) = line.strip_prefix("MemTotal:") {
                let value = rest.trim().trim_end_matches("kB").trim();
                let kib = parse_value::<u64>(value, lineno)?;
                return Ok(Self {
                    mem_total: kib * 1024,
                });
            }
            line.clear();
        }

        Err(StatParseError::MissingField { field: "MemTotal" })
    }
}

/// Memory usage of a cgroup, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct MemStat {
    /// The smaller of the hierarchical limit and host memory.
    pub total: u64,
    /// Resident memory including mapped files.
    pub rss: u64,
    /// Page cache.
    pub cached: u64,
    pub mapped_file: u64,
    pub swap_total: u64,
    pub swap_used: u64,
}

impl MemStat {
    /// Combines `memory.stat` counters with host memory information.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::MissingField`] if `memory.stat` did not contain
    /// `hierarchical_memory_limit`.
    pub fn from_parts(
        counters: &MemoryCounters,
        host: &HostMemInfo,
    ) -> Result<Self, StatParseError> {
        let limit = counters
            .hierarchical_memory_limit
            .ok_or(StatParseError::MissingField {
                field: "hierarchical_memory_limit",
            })?;

        let (swap_total, swap_used) = match counters.hierarchical_memsw_limit {
            Some(memsw) if memsw != limit => (memsw.saturating_sub(limit), counters.total_swap),
            _ => (0, 0),
        };

        Ok(Self {
            total: limit.min(host.mem_total),
            rss: counters.total_rss + counters.total_mapped_file,
            cached: counters.total_cache,
            mapped_file: counters.total_mapped_file,
            swap_total,
            swap_used,
        })
    }
}

impl fmt::Display for MemStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Total: {} RSS: {} Cached: {} MappedFile: {}",
            self.total / MIB,
            self.rss / MIB,
            self.cached / MIB,
            self.mapped_file / MIB
        )?;
        write!(
            f,
            "SwapTotal: {} SwapUsed: {}",
            self.swap_total / MIB,
            self.swap_used / MIB
        )
    }
}
