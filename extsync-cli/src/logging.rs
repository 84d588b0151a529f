//! Subscriber setup for the `extsync` binary.
//!
//! Library crates log through the `log` facade; the fmt subscriber's log
//! bridge picks those records up. Output goes to stderr so `--json` reports
//! on stdout stay parseable.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `-v`.
///
/// Fails when a global subscriber is already installed.
pub fn init(verbose: u8) -> Result<()> {
    let default = if verbose > 0 { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))?;
    tracing::debug!("logging initialised at {default}");
    Ok(())
}
