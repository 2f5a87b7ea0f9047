use tally_harness::HarnessError;
use tally_telemetry::TelemetryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Config failed: {0}")]
    ConfigFailed(String),
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("Harness error: {0}")]
    Harness(#[from] HarnessError),
    #[error("Runtime error: {0}")]
    Runtime(String),
}
