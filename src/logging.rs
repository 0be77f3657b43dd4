//! Log subscriber setup for the command-line tool
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Filter directive used when RUST_LOG is unset
pub fn default_directive(config: &LoggingConfig, verbose: bool) -> String {
    if verbose {
        "debug".to_string()
    } else {
        config.level.to_lowercase()
    }
}

/// Install a stderr `fmt` subscriber
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config, verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
