use anyhow::{Context, Result};
use config::{Config as ConfigSource, Environment, File, FileFormat, Map};
use std::{path::Path, time::Duration};
use tracing::{debug, info};

use crate::{cli_args::CommandArgs, settings::models::Settings};

const ENV_PREFIX: &str = "TALLY";

/// Environment source for `TALLY_`-prefixed variables.
///
/// Nested keys are separated by `__`, so `TALLY_HARNESS__THRESHOLD` maps to
/// `harness.threshold`. List keys take comma separated values. When `vars` is
/// given it replaces the process environment.
pub fn env_source(vars: Option<Map<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("harness.units")
        .with_list_parse_key("harness.fault_units")
        .source(vars)
}

/// Load settings from an optional TOML file overlaid with the environment.
///
/// Keys missing from every source fall back to [`Settings::default`].
pub fn load_settings(
    config_path: Option<&Path>,
    env_vars: Option<Map<String, String>>,
) -> Result<Settings> {
    let mut builder = ConfigSource::builder();

    if let Some(path) = config_path {
        info!("Loading configuration from {}", path.display());
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }

    let config_source = builder
        .add_source(env_source(env_vars))
        .build()
        .context("Failed to build config")?;

    config_source
        .try_deserialize()
        .context("Failed to deserialize settings")
}

/// Apply CLI arguments to the configuration. Flags win over every other source.
pub fn apply_command_line_args(mut settings: Settings, args: &CommandArgs) -> Settings {
    let harness_args = &args.harness;
    let harness = &mut settings.harness;

    if !harness_args.units.is_empty() {
        harness.units.clone_from(&harness_args.units);
    }
    if let Some(threshold) = harness_args.threshold {
        harness.threshold = threshold;
    }
    if let Some(tick_ms) = harness_args.tick_ms {
        harness.tick_interval = Duration::from_millis(tick_ms);
    }
    if let Some(seed) = harness_args.seed {
        harness.seed = Some(seed);
    }
    if !harness_args.fault_units.is_empty() {
        harness.fault_units.clone_from(&harness_args.fault_units);
    }
    if let Some(code) = harness_args.fault_status_code {
        harness.fault_status_code = code;
    }

    let telemetry_args = &args.telemetry;
    let telemetry = &mut settings.telemetry;

    if let Some(endpoint) = &telemetry_args.endpoint {
        telemetry.endpoint.clone_from(endpoint);
    }
    if let Some(protocol) = telemetry_args.protocol {
        telemetry.protocol = protocol;
    }
    if let Some(insecure) = telemetry_args.insecure {
        telemetry.insecure = insecure;
    }
    if let Some(timeout_secs) = telemetry_args.timeout_secs {
        telemetry.timeout = Duration::from_secs(timeout_secs);
    }
    if let Some(name) = &telemetry_args.service_name {
        telemetry.service.name.clone_from(name);
    }
    if let Some(environment) = &telemetry_args.environment {
        telemetry.service.environment.clone_from(environment);
    }
    if let Some(version) = &telemetry_args.service_version {
        telemetry.service.version.clone_from(version);
    }

    debug!("Effective settings: {:?}", settings);
    settings
}
