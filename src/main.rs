/// Entry point for the contmetric container monitor.
///
/// Prints one JSON object per interval with the CPU, memory, disk, and network
/// statistics of the cgroup this process runs in.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug CONTMETRIC_INTERVAL_MS=500 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    contmetric::run().await?;
    Ok(())
}
