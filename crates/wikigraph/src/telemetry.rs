//! Subscriber setup for `tracing` spans and `log` records.

use tracing_subscriber::EnvFilter;
use wikigraph_core::{Error, Result, WikiGraphConfig};

/// Output format of the fmt subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// `RUST_LOG` when set, otherwise `fallback`
fn filter(fallback: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(fallback)
            .map_err(|e| Error::config_error(format!("Invalid log level '{}': {}", fallback, e))),
    }
}

/// Install the global subscriber at the configured level.
///
/// `log` records from the library crates are forwarded to the same
/// subscriber. Fails if a global subscriber is already installed.
pub fn init(config: &WikiGraphConfig) -> Result<()> {
    init_with(&config.log_level, LogFormat::Text)
}

pub fn init_with(level: &str, format: LogFormat) -> Result<()> {
    let filter = filter(level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| Error::config_error(format!("Logging already initialized: {}", e)))
}
