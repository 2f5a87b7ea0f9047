pub mod models;
pub mod sources;
pub mod validation;


pub use models::Settings;

use anyhow::{Context, Result};

use crate::cli_args::CommandArgs;

/// Load and validate settings from all available sources.
///
/// # Precedence Order
/// 1. CLI parameters override all other sources
/// 2. `TALLY_` environment variables (including those from `.env`) override the config file
/// 3. The config file given by `--config` overrides built-in defaults
pub fn settings(args: &CommandArgs) -> Result<Settings> {
    let loaded = sources::load_settings(args.config.as_deref(), None)
        .context("Failed to load settings")?;

    let config = sources::apply_command_line_args(loaded, args);

    validation::validate_config(&config)?;

    Ok(config)
}
