//! Diagnostic log output.
//!
//! Logs always go to stderr; stdout carries command output only.

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Builds the filter: `RUST_LOG` wins, then the configured level, then `warn`.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("vecroute=debug")
    } else {
        env_filter(config)
    };

    let _ = fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
