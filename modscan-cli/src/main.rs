//! modscan CLI entry point
//!
//! Parses arguments, loads configuration, initializes logging and dispatches
//! to the subcommand handlers. Errors are printed to stderr and mapped to
//! process exit codes via [`CliError::exit_code`].

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;

use modscan_core::config::{GeneralConfig, ModscanConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli {
        config: config_path,
        log_level,
        output,
        command,
    } = cli;
    let writer = OutputWriter::new(output);

    match command {
        Commands::Config(args) => {
            // config 명령은 설정 파일이 깨져 있어도 보고할 수 있어야 한다
            let mut general = GeneralConfig::default();
            if let Some(level) = log_level {
                general.log_level = level;
            }
            logging::init_tracing(&general)?;
            commands::config::execute(args, config_path.as_deref(), &writer).await
        }
        Commands::Scan(args) => {
            let config = prepare(config_path, log_level).await?;
            commands::scan::execute(args, &config, &writer).await
        }
        Commands::Describe(args) => {
            let config = prepare(config_path, log_level).await?;
            commands::describe::execute(args, &config, &writer).await
        }
    }
}

/// Load configuration, apply the `--log-level` override and start logging.
async fn prepare(
    config_path: Option<PathBuf>,
    log_level: Option<String>,
) -> Result<ModscanConfig, CliError> {
    let mut config = commands::load_config(config_path.as_deref()).await?;
    if let Some(level) = log_level {
        config.general.log_level = level;
        config.validate()?;
    }

    logging::init_tracing(&config.general)?;
    modscan_core::metrics::describe_metrics();

    tracing::debug!(
        config = ?config_path.as_ref().map(|p| p.display().to_string()),
        "configuration loaded"
    );
    Ok(config)
}
