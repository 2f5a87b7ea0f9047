use anyhow::Result;
use clap::Parser;
use tally_cli::{
    cli_args::{Cli, Commands},
    error::CliError,
    run::{run_instrumented, run_plain},
    settings::settings as load_settings,
};
use tally_telemetry::setup_log_subscriber;

/// Runs the counter harness in the selected mode.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let args = cli.command.args();

    // Installed before settings are loaded so their diagnostics reach the console
    let log_bridge = setup_log_subscriber(&args.log_level);

    let config = load_settings(args).map_err(|e| CliError::ConfigFailed(format!("{:#}", e)))?;

    match &cli.command {
        Commands::Plain(_) => {
            run_plain(config.harness).await?;
        }
        Commands::Instrumented(_) => {
            run_instrumented(config.harness, &config.telemetry, log_bridge.as_ref()).await?;
        }
    }

    Ok(())
}
