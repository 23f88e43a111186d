//! This module provides parsing utilities for cgroup v1 block I/O byte counters.
//!
//! The blkio controller reports bytes per device and operation in files such as
//! `blkio.io_service_bytes_recursive` or `blkio.throttle.io_service_bytes`:
//!
//! ```text
//! 8:0 Read 1024
//! 8:0 Write 2048
//! 8:0 Sync 3072
//! 8:0 Async 0
//! 8:0 Total 3072
//! Total 3072
//! ```
//!
//! [`DiskStat`] sums the `Read` and `Write` rows across all devices. Rows that do not
//! have exactly three columns (like the trailing grand total) are ignored, and a
//! count that fails to parse contributes zero. Sums wrap around on overflow.
//!
//! # Example
//!
//! ```rust
//! use contmetric::cgroup::stats::DiskStat;
//!
//! let data = "8:0 Read 1024\n8:0 Write 2048\n8:16 Read 1\nTotal 3073\n";
//! let stat = DiskStat::from_reader(&mut data.as_bytes()).unwrap();
//! assert_eq!(stat.read, 1025);
//! assert_eq!(stat.write, 2048);
//! ```

use std::fmt;
use std::io::BufRead;

use super::StatParseError;

/// Aggregated block I/O byte counters, summed across devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct DiskStat {
    /// Total bytes read.
    pub read: u64,
    /// Total bytes written.
    pub write: u64,
}

impl DiskStat {
    /// Parses a blkio service-bytes file.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::Io`] if reading fails.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut stat = DiskStat::default();
        let mut line = String::new();

        while buf.read_line(&mut line)? != 0 {
            let mut parts = line.split_whitespace();
            if let (Some(_device), Some(op), Some(bytes), None) =
                (parts.next(), parts.next(), parts.next(), parts.next())
            {
                let bytes = bytes.parse::<u64>().unwrap_or(0);
                match op {
                    "Read" => stat.read = stat.read.wrapping_add(bytes),
                    "Write" => stat.write = stat.write.wrapping_add(bytes),
                    _ => {}
                }
            }
            line.clear();
        }

        Ok(stat)
    }

    /// Returns `true` if any bytes were read or written.
    pub fn has_activity(&self) -> bool {
        self.read > 0 || self.write > 0
    }
}

impl fmt::Display for DiskStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Read: {}, Write: {}", self.read, self.write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_disk_stat() {
        let stat = DiskStat::from_reader(&mut "".as_bytes()).unwrap();
        assert_eq!(stat, DiskStat::default());
        assert!(!stat.has_activity());
    }

    #[test]
    fn test_parse_complete_disk_stat() {
        let data = "\
8:0 Read 1024
8:0 Write 2048
8:0 Sync 3072
8:0 Async 0
8:0 Total 3072
253:0 Read 100
253:0 Write 200
Total 3372
";
        let stat = DiskStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.read, 1124);
        assert_eq!(stat.write, 2248);
        assert!(stat.has_activity());
    }

    #[test]
    fn test_unparsable_counts_are_zero() {
        let data = "8:0 Read abc\n8:0 Write 10\n";
        let stat = DiskStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.read, 0);
        assert_eq!(stat.write, 10);
    }

    #[test]
    fn test_rows_with_extra_columns_are_ignored() {
        let data = "8:0 Read 10 extra\n8:0 Write 10\n";
        let stat = DiskStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.read, 0);
        assert_eq!(stat.write, 10);
    }

    #[test]
    fn test_large_counters() {
        let data = "8:0 Read 18446744073709551615\n8:0 Write 1\n";
        let stat = DiskStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.read, u64::MAX);
        assert!(stat.has_activity());

        let data = "8:0 Read 18446744073709551615\n8:16 Read 2\n";
        let stat = DiskStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.read, 1);
    }

    #[test]
    fn test_disk_stat_display() {
        let stat = DiskStat { read: 1, write: 2 };
        assert_eq!(stat.to_string(), "Read: 1, Write: 2");
    }
}
