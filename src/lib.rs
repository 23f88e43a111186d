//! Contmetric: a container resource monitor that reads the cgroup v1 pseudo-files
//! of the cgroup it runs in.
//!
//! This library resolves the CPU limits of the container, measures its CPU usage
//! over fixed intervals, and collects memory, block I/O, and network statistics.

use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use cgroup::stats::StatsEntry;
use cgroup::{CgroupPaths, Collector, CpuLimits, CpuSampler};
use config::Config;

pub mod cgroup;
pub mod clock;
pub mod config;
pub mod error;
pub mod fsutil;

pub use error::{Error, ResultOkLogExt};

/// Writes one stats entry as a JSON line.
///
/// # Errors
///
/// Returns an [`Error`] if the entry cannot be serialized or written.
pub fn emit(entry: &StatsEntry, out: &mut impl Write) -> Result<(), Error> {
    serde_json::to_writer(&mut *out, entry)?;
    writeln!(out)?;
    Ok(())
}

/// Runs the monitor.
///
/// Resolves the CPU limits once, then every interval collects a [`StatsEntry`]
/// and prints it as JSON on stdout once its CPU measurement completes.
///
/// # Errors
///
/// Possible errors include:
/// - An invalid `CONTMETRIC_INTERVAL_MS`.
/// - A system clock set before the UNIX epoch.
pub async fn run() -> Result<(), Error> {
    let config = Config::from_env()?;
    log::debug!(
        "rootfs: {}, interval: {:?}",
        config.rootfs.display(),
        config.interval
    );

    let paths = CgroupPaths::new(&config.rootfs);
    let limits = CpuLimits::resolve(&paths);
    let sampler = CpuSampler::new(&paths, limits);
    let mut collector = Collector::discover(paths);

    let (tx, mut rx) = tokio::sync::mpsc::channel::<StatsEntry>(10);
    tokio::spawn(async move {
        while let Some(entry) = rx.recv().await {
            let mut stdout = std::io::stdout().lock();
            if let Err(err) = emit(&entry, &mut stdout) {
                log::error!("failed to emit stats: {err}");
            }
        }
    });

    let mut interval = tokio::time::interval(config.interval);
    loop {
        interval.tick().await;
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        log::trace!("collecting stats@{timestamp}");

        let mut entry = collector.collect(timestamp);
        let tx = tx.clone();
        sampler.sample_cpu_usage(config.interval, move |result| {
            entry.cpu = result.ok_log("failed to sample cpu usage");
            if let Err(err) = tx.try_send(entry) {
                log::warn!("dropping stats entry: {err}");
            }
        });
    }
}
