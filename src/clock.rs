//! Kernel clock tick rate (`CLK_TCK`, also known as `USER_HZ`).
//!
//! Host-wide CPU time in `/proc/stat` is counted in clock ticks, while the
//! cgroup `cpuacct.usage` counter is in nanoseconds. The tick rate converts one
//! into the other:
//!
//! ```text
//! nanoseconds = ticks * 1e9 / CLK_TCK
//! ```

use nix::unistd::{SysconfVar, sysconf};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

#[derive(Debug, thiserror::Error)]
pub enum ClockTickError {
    #[error("failed to query CLK_TCK: {0}")]
    Sysconf(#[from] nix::Error),
    #[error("CLK_TCK is not supported on this host")]
    Unsupported,
    #[error("invalid CLK_TCK value {0}")]
    Invalid(i64),
}

/// Queries the number of clock ticks per second.
///
/// # Errors
///
/// Returns a [`ClockTickError`] if the query fails or yields a non-positive value.
pub fn clock_tick_hz() -> Result<u64, ClockTickError> {
    match sysconf(SysconfVar::CLK_TCK)? {
        Some(hz) if hz > 0 => Ok(hz as u64),
        Some(hz) => Err(ClockTickError::Invalid(hz as i64)),
        None => Err(ClockTickError::Unsupported),
    }
}

/// Returns the number of nanoseconds in one clock tick, or `0.0` for an unresolved rate.
pub fn tick_to_nanos(clock_tick_hz: u64) -> f64 {
    if clock_tick_hz == 0 {
        return 0.0;
    }
    NANOS_PER_SEC / clock_tick_hz as f64
}
