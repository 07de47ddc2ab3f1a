//! Tracing subscriber setup shared by client binaries and tools

use crate::sync_config::LoggingConfig;
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow!("Invalid log filter '{}': {}", config.level, e))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.json {
        builder.json().try_init().map_err(|e| anyhow!(e))
    } else {
        builder.try_init().map_err(|e| anyhow!(e))
    }
}
