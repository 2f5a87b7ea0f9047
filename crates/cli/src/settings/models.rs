use serde::{Deserialize, Serialize};
use tally_harness::HarnessConfig;
use tally_telemetry::TelemetryConfig;

/// Complete settings for one `tally` invocation.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides:
///
/// ```toml
/// [harness]
/// units = ["load", "store"]
/// threshold = 100
///
/// [telemetry]
/// endpoint = "collector:4317"
/// insecure = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Workload and fault-injection settings
    pub harness: HarnessConfig,

    /// OTLP export settings, only used by the `instrumented` command
    pub telemetry: TelemetryConfig,
}
