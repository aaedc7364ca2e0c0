//! Command handlers -- one module per subcommand

pub mod config;
pub mod describe;
pub mod scan;

use std::path::Path;

use modscan_core::config::ModscanConfig;

use crate::error::CliError;

/// Load the effective configuration.
///
/// With a path the file is loaded (env overrides applied, validated);
/// without one the built-in defaults plus env overrides are used.
pub async fn load_config(path: Option<&Path>) -> Result<ModscanConfig, CliError> {
    match path {
        Some(path) => Ok(ModscanConfig::load(path).await?),
        None => {
            let mut config = ModscanConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }
}
