use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

const ROOTFS_VAR: &str = "CONTMETRIC_ROOTFS";
const INTERVAL_VAR: &str = "CONTMETRIC_INTERVAL_MS";
const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for CONTMETRIC_INTERVAL_MS, expected a positive number of milliseconds")]
    InvalidInterval { value: String },
}

/// Runtime settings of the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prefix under which `proc` and `sys` are found.
    pub rootfs: PathBuf,
    /// Sampling interval and emission period.
    pub interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rootfs: PathBuf::from("/"),
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl Config {
    /// Reads `CONTMETRIC_ROOTFS` and `CONTMETRIC_INTERVAL_MS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidInterval`] if the interval is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::var_os(ROOTFS_VAR),
            std::env::var_os(INTERVAL_VAR),
        )
    }

    fn from_vars(
        rootfs: Option<OsString>,
        interval_ms: Option<OsString>,
    ) -> Result<Self, ConfigError> {
        let rootfs = rootfs
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/"));
        let interval = match interval_ms {
            Some(value) => parse_interval(&value.to_string_lossy())?,
            None => DEFAULT_INTERVAL,
        };
        Ok(Self { rootfs, interval })
    }
}

fn parse_interval(value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidInterval {
            value: value.to_owned(),
        }),
    }
}
