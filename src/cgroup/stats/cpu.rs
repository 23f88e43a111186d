//! This module provides parsing utilities for the CPU-related pseudo-files of
//! cgroup v1 and procfs, plus the [`CpuStat`] record produced by the sampler.
//!
//! - **`/proc/stat`**: the aggregate `cpu` line holds host-wide CPU time per
//!   category in clock ticks. [`SystemCpuTime`] sums every field of that line.
//! - **`cpuacct.usage_percpu`**: one cumulative counter per core.
//!   [`PerCpuUsage`] only counts the entries; the values are irrelevant.
//! - **`cpu.stat`**: `key value` lines with CFS bandwidth counters, read as
//!   [`KeyedCounters`](super::KeyedCounters) by the sampler.
//! - **`cpuset.cpus`**: a compact list of core indices and inclusive ranges
//!   such as `0-3,8,10-11`, parsed by [`parse_cpu_list`] / [`CpuList`].
//!
//! # Examples
//!
//! ```rust
//! use contmetric::cgroup::stats::{CpuList, SingleLineStat, SystemCpuTime};
//!
//! let data = "cpu  42812 0 17335 3256641 333 9 1748 0 0 0\ncpu0 21406 0 8667 1628320 166 4 874 0 0 0\n";
//! let system = SystemCpuTime::from_reader(&mut data.as_bytes()).unwrap();
//! assert_eq!(system.total_ticks, 3_318_878);
//!
//! let cpus = CpuList::from_reader(&mut "0,2,4-6\n".as_bytes()).unwrap();
//! assert_eq!(cpus.core_count, 5);
//! ```

use std::fmt;
use std::io::{BufRead, Read};

use super::parser::parse_value;
use super::{SingleLineStat, StatParseError};

const AGGREGATE_CPU_PREFIX: &str = "cpu ";

/// Host-wide cumulative CPU time from the aggregate `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemCpuTime {
    /// Sum of every field of the aggregate line, in clock ticks.
    pub total_ticks: u64,
}

impl SystemCpuTime {
    /// Parses `/proc/stat` content, summing all fields of the first `cpu ` line.
    ///
    /// Fields are added unconditionally, idle and iowait included.
    ///
    /// # Errors
    ///
    /// - [`StatParseError::InvalidValue`] if a field of the aggregate line is not a number.
    /// - [`StatParseError::Overflow`] if the sum does not fit in a `u64`.
    /// - [`StatParseError::MissingField`] if there is no aggregate line.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            if let Some(fields) = line.strip_prefix(AGGREGATE_CPU_PREFIX) {
                let mut total_ticks = 0u64;
                for field in fields.split_whitespace() {
                    total_ticks = total_ticks
                        .checked_add(parse_value::<u64>(field, lineno)?)
                        .ok_or(StatParseError::Overflow { line: lineno })?;
                }
                return Ok(Self { total_ticks });
            }
            line.clear();
        }

        Err(StatParseError::MissingField { field: "cpu" })
    }
}

/// Per-core usage counters from `cpuacct.usage_percpu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerCpuUsage {
    /// Number of per-core accounting slots.
    pub core_count: u64,
}

impl SingleLineStat for PerCpuUsage {
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut data = String::new();
        buf.read_to_string(&mut data)?;
        Ok(Self {
            core_count: data.split_whitespace().count() as u64,
        })
    }
}

/// Counts the cores in a cpuset list such as `0-3,8,10-11`.
///
/// Ranges are inclusive on both ends and order is irrelevant. Overlapping
/// entries are summed as written. An empty list yields `0` rather than counting
/// the empty entry as one core.
///
/// # Errors
///
/// Returns [`StatParseError::InvalidCpuList`] if any entry is not a core index
/// or a `low-high` range with `low <= high`. No partial count is returned.
pub fn parse_cpu_list(list: &str) -> Result<u64, StatParseError> {
    let list = list.trim();
    if list.is_empty() {
        return Ok(0);
    }

    let invalid = || StatParseError::InvalidCpuList {
        list: list.to_owned(),
    };

    let mut cores = 0u64;
    for entry in list.split(',') {
        match entry.split_once('-') {
            None => {
                entry.trim().parse::<u64>().map_err(|_| invalid())?;
                cores += 1;
            }
            Some((low, high)) => {
                // `high` still contains any further '-' and fails to parse.
                let low = low.trim().parse::<u64>().map_err(|_| invalid())?;
                let high = high.trim().parse::<u64>().map_err(|_| invalid())?;
                if high < low {
                    return Err(invalid());
                }
                cores += high - low + 1;
            }
        }
    }

    Ok(cores)
}

/// The cores a cgroup may run on, from `cpuset.cpus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuList {
    pub core_count: u64,
}

impl SingleLineStat for CpuList {
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut data = String::new();
        buf.read_to_string(&mut data)?;
        Ok(Self {
            core_count: parse_cpu_list(&data)?,
        })
    }
}

/// Result of one CPU sampling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct CpuStat {
    /// Cores the cgroup is allowed to use (quota/period or cpuset size).
    pub limited_cores: f64,
    /// Usage in percent of one core, so `200.0` means two full cores. Not clamped.
    pub usage: f64,
    /// Cumulative `nr_throttled` from `cpu.stat` at the end of the interval.
    pub throttled: u64,
}

impl fmt::Display for CpuStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LimitedCores: {:.2}, Usage: {:.2}%, Throttled: {}",
            self.limited_cores, self.usage, self.throttled
        )
    }
}
