//! Provides generic traits for parsing kernel pseudo-files into structured types.
//!
//! Two shapes of file cover nearly everything under `/sys/fs/cgroup` (v1) and `/proc`:
//!
//! - [`SingleLineStat`]: the whole file is one value, e.g. `cpuacct.usage` or
//!   `cpu.cfs_quota_us`. Implemented for `u64` and `i64` directly.
//! - [`KeyValueStat`]: one `key value` pair per line, e.g. `cpu.stat` or `memory.stat`.
//!   Implementors register field handlers for the keys they care about.
//!
//! [`KeyedCounters`] is the untyped sibling of [`KeyValueStat`], collecting every
//! well-formed line into a map.
//!
//! # Leniency policy
//!
//! Key-value files are a loose kernel convention rather than a strict schema and
//! gain new lines between kernel releases. A line whose first token is not followed
//! by an unsigned integer is skipped, never reported as an error.
//!
//! # Example: Implementing `KeyValueStat`
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::LazyLock;
//! use contmetric::cgroup::stats::KeyValueStat;
//!
//! #[derive(Default)]
//! struct MyStat {
//!     foo: u64,
//! }
//!
//! static HANDLERS: LazyLock<HashMap<&'static str, fn(&mut MyStat, u64)>> = LazyLock::new(|| {
//!     let mut m: HashMap<&'static str, fn(&mut MyStat, u64)> = HashMap::new();
//!     m.insert("foo", |stat, v| stat.foo = v);
//!     m
//! });
//!
//! impl KeyValueStat for MyStat {
//!     fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
//!         &HANDLERS
//!     }
//! }
//!
//! let stat = MyStat::from_reader(&mut "foo 42\nbar 7\n".as_bytes()).unwrap();
//! assert_eq!(stat.foo, 42);
//! ```

use std::collections::HashMap;
use std::io::{BufRead, Read};
use std::num::ParseIntError;
use std::str::FromStr;

use super::StatParseError;

/// Parses `value` as a number, attributing failures to `line`.
pub(crate) fn parse_value<T>(value: &str, line: usize) -> Result<T, StatParseError>
where
    T: FromStr<Err = ParseIntError>,
{
    value
        .parse::<T>()
        .map_err(|source| StatParseError::InvalidValue {
            value: value.to_string(),
            line,
            source,
        })
}

/// Splits a `key value [rest...]` line into its key and unsigned value.
///
/// Returns `None` for lines that do not have that shape.
pub(crate) fn parse_counter_line(line: &str) -> Option<(&str, u64)> {
    let mut parts = line.split_whitespace();
    let key = parts.next()?;
    let value = parts.next()?.parse::<u64>().ok()?;
    Some((key, value))
}

/// A trait for parsing single-value pseudo-files, such as `cpuacct.usage`
/// or `cpu.cfs_quota_us`.
pub trait SingleLineStat: Sized {
    /// Parses the statistic from the provided buffered reader.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::Io`] if reading fails and a content error
    /// if the value is malformed.
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError>;
}

impl SingleLineStat for u64 {
    /// Parses the whole input, trimmed, as an unsigned decimal.
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut data = String::new();
        buf.read_to_string(&mut data)?;
        parse_value(data.trim(), 1)
    }
}

impl SingleLineStat for i64 {
    /// Parses the whole input, trimmed, as a signed decimal.
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut data = String::new();
        buf.read_to_string(&mut data)?;
        parse_value(data.trim(), 1)
    }
}

/// A trait for parsing `key value` style files such as `cpu.stat` or `memory.stat`.
///
/// Implementors define a set of known keys and how to apply values for them.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    /// Returns a map of known field names and the handlers that apply parsed values.
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)>;

    /// Parses a key-value formatted buffer.
    ///
    /// Unknown keys are handed to [`KeyValueStat::on_unknown_key`] and malformed
    /// lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::Io`] only; content is never a hard failure.
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut stat = Self::default();
        let handlers = Self::field_handlers();

        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            match parse_counter_line(&line) {
                Some((key, value)) => match handlers.get(key) {
                    Some(handler) => handler(&mut stat, value),
                    None => Self::on_unknown_key(key, value, lineno),
                },
                None => log::trace!("skipping malformed line {lineno}: {:?}", line.trim_end()),
            }
            line.clear();
        }

        Ok(stat)
    }

    /// Called when a key in the input is not found in the `field_handlers()` map.
    ///
    /// By default, unknown keys are silently ignored.
    #[inline]
    fn on_unknown_key(_key: &str, _value: u64, _lineno: usize) {}
}

/// Every well-formed `key value` line of a file, keyed by the first token.
///
/// When a key repeats, the last occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyedCounters(HashMap<String, u64>);

impl KeyedCounters {
    /// Collects all `key value` lines from the reader, skipping malformed ones.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::Io`] if reading fails.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut counters = HashMap::new();
        let mut line = String::new();
        while buf.read_line(&mut line)? != 0 {
            if let Some((key, value)) = parse_counter_line(&line) {
                counters.insert(key.to_owned(), value);
            }
            line.clear();
        }
        Ok(Self(counters))
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
