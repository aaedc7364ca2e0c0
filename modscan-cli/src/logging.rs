//! Logging initialization for the modscan CLI.
//!
//! Configures `tracing-subscriber` from the `[general]` section of
//! `ModscanConfig`. Logs go to stderr so stdout carries only command output.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use modscan_core::config::GeneralConfig;

use crate::error::CliError;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level`.
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines
/// * `"pretty"` - Human-readable output
pub fn init_tracing(config: &GeneralConfig) -> Result<(), CliError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| {
                CliError::Config(format!("failed to initialize JSON tracing subscriber: {e}"))
            }),
        "pretty" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| {
                CliError::Config(format!("failed to initialize pretty tracing subscriber: {e}"))
            }),
        other => Err(CliError::Config(format!(
            "unknown log format '{other}', expected 'json' or 'pretty'"
        ))),
    }
}
