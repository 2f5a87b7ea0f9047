use anyhow::{Result, anyhow};
use tally_harness::{HarnessConfig, validate_unit_names};
use tally_telemetry::TelemetryConfig;
use tracing::warn;

use crate::settings::models::Settings;

/// Validate the merged settings before anything is started.
pub fn validate_config(settings: &Settings) -> Result<()> {
    validate_harness(&settings.harness)?;
    validate_telemetry(&settings.telemetry)?;
    Ok(())
}

fn validate_harness(config: &HarnessConfig) -> Result<()> {
    validate_unit_names(&config.units).map_err(|e| anyhow!("Invalid harness units: {}", e))?;

    if config.threshold == 0 {
        return Err(anyhow!("Harness threshold must be greater than zero"));
    }

    if config.root_span.trim().is_empty() {
        return Err(anyhow!("Root span name must not be empty"));
    }

    for fault_unit in &config.fault_units {
        if !config.units.contains(fault_unit) {
            warn!("Fault unit '{}' is not among the configured units", fault_unit);
        }
    }

    Ok(())
}

fn validate_telemetry(config: &TelemetryConfig) -> Result<()> {
    if config.endpoint.trim().is_empty() {
        return Err(anyhow!("Telemetry endpoint must not be empty"));
    }

    if config.timeout.is_zero() {
        return Err(anyhow!("Telemetry export timeout must be greater than zero"));
    }

    if config.export_interval.is_zero() {
        return Err(anyhow!("Metric export interval must be greater than zero"));
    }

    if !config.any_signal_enabled() {
        warn!("All telemetry signals are disabled, nothing will be exported");
    }

    Ok(())
}
