//! Tracing setup for the perfdash CLI
//!
//! Usage:
//!   perfdash --debug serve             # Debug logging to console
//!   RUST_LOG=perfdash=debug perfdash   # Fine-grained log control

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Initialize console tracing.
///
/// `debug` sets the default level to debug; an explicit RUST_LOG always
/// wins.
pub fn init(debug: bool) -> Result<()> {
    let default_filter = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug) // Show targets in debug mode
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
