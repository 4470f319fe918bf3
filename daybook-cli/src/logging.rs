use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Log to stderr; stdout carries the run's JSON response.
///
/// `RUST_LOG` wins when set, otherwise `info` (or `debug` with `--verbose`).
pub fn init(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))
}
