//! Tracing subscriber setup
//!
//! Logs go to stderr: in stdio mode stdout carries the protocol.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Build the filter from a directive string such as `info` or
/// `wisl_lsp=debug,tower_lsp=warn`.
pub fn env_filter(directives: &str) -> Result<EnvFilter> {
    Ok(EnvFilter::try_new(directives)?)
}

/// Install the global subscriber.
pub fn init(directives: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(directives)?)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}
