//! Readers for kernel pseudo-files.
//!
//! Every read opens the file afresh, so a controller that is remounted between
//! two reads is picked up again. There are no retries: the first failure is returned.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use crate::cgroup::stats::{KeyedCounters, SingleLineStat, StatParseError};

/// Error that occurs when reading a pseudo-file fails.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The file does not exist, e.g. the controller is not mounted.
    #[error("file `{path}` does not exist")]
    NotFound { path: PathBuf },

    #[error("failed to read file `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: StatParseError,
    },
}

impl ReadError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ReadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ReadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    fn from_parse(path: &Path, source: StatParseError) -> Self {
        match source {
            StatParseError::Io(source) => Self::from_io(path, source),
            source => ReadError::Parse {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Returns the path of the file that failed.
    pub fn path(&self) -> &Path {
        match self {
            ReadError::NotFound { path }
            | ReadError::Io { path, .. }
            | ReadError::Parse { path, .. } => path,
        }
    }
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns [`ReadError::NotFound`] if the file does not exist and
/// [`ReadError::Io`] for any other failure.
///
/// # Example
/// ```no_run
/// # use contmetric::fsutil;
/// let reader = fsutil::open_file_reader("/proc/stat")?;
/// # Ok::<(), fsutil::ReadError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, ReadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ReadError::from_io(path, source))?;
    Ok(BufReader::new(file))
}

/// Opens the file at `path` and hands it to `parse`.
///
/// # Errors
///
/// Returns a [`ReadError`] carrying `path` if opening, reading, or parsing fails.
pub fn read_file<T>(
    path: impl AsRef<Path>,
    parse: impl FnOnce(&mut BufReader<File>) -> Result<T, StatParseError>,
) -> Result<T, ReadError> {
    let path = path.as_ref();
    let mut reader = open_file_reader(path)?;
    parse(&mut reader).map_err(|source| ReadError::from_parse(path, source))
}

/// Reads a [`SingleLineStat`] from the file at `path`.
pub fn read_stat<T: SingleLineStat>(path: impl AsRef<Path>) -> Result<T, ReadError> {
    read_file(path, |reader| T::from_reader(reader))
}

/// Reads the whole file as one trimmed unsigned decimal.
pub fn read_unsigned_counter(path: impl AsRef<Path>) -> Result<u64, ReadError> {
    read_stat::<u64>(path)
}

/// Reads the whole file as one trimmed signed decimal.
pub fn read_signed_counter(path: impl AsRef<Path>) -> Result<i64, ReadError> {
    read_stat::<i64>(path)
}

/// Reads every well-formed `key value` line of the file. Malformed lines are skipped.
pub fn read_keyed_counters(path: impl AsRef<Path>) -> Result<KeyedCounters, ReadError> {
    read_file(path, KeyedCounters::from_reader)
}
