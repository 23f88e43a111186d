//! Defines structured error types for parsing cgroup and procfs pseudo-files.
//!
//! This module provides the [`StatParseError`] enum, which separates content
//! problems (a value that is not a number, a malformed cpu list, a required
//! field that never showed up) from the I/O failures encountered while reading.
//!
//! # Error Types
//!
//! - [`StatParseError::InvalidValue`]: a numeric value failed to parse.
//! - [`StatParseError::InvalidCpuList`]: a cpuset list (e.g. `cpuset.cpus`) is malformed.
//! - [`StatParseError::Overflow`]: summed counters exceed `u64`.
//! - [`StatParseError::MissingField`]: a line or key the parser requires is absent.
//! - [`StatParseError::Io`]: wraps underlying I/O errors during reads.
//!
//! # Example
//!
//! ```rust
//! use contmetric::cgroup::stats::StatParseError;
//!
//! fn parse_value(val: &str) -> Result<u64, StatParseError> {
//!     val.parse::<u64>().map_err(|source| StatParseError::InvalidValue {
//!         value: val.to_string(),
//!         line: 1,
//!         source,
//!     })
//! }
//!
//! parse_value("not-a-number").unwrap_err();
//! ```

use std::num::ParseIntError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatParseError {
    #[error("invalid value at line {line}: '{value}': {source}")]
    InvalidValue {
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid cpu list format: '{list}'")]
    InvalidCpuList { list: String },

    #[error("counter overflow at line {line}")]
    Overflow { line: usize },

    #[error("missing field '{field}'")]
    MissingField { field: &'static str },

    #[error("error during I/O: {0}")]
    Io(#[from] std::io::Error),
}
