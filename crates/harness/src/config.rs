use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use std::time::Duration;

use crate::{
    fault::{DEFAULT_FAULT_STATUS_CODE, FaultUnits},
    workload::DEFAULT_THRESHOLD,
};

pub const DEFAULT_ROOT_SPAN: &str = "parent";

/// Suspension between two ticks of a unit.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

pub const DEFAULT_UNITS: [&str; 3] = ["first-child", "second-child", "third-child"];

pub const DEFAULT_FAULT_UNIT: &str = "second-child";

/// Settings for one harness run.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Units of work, run in this order. Names must be unique.
    pub units: Vec<String>,

    /// Cumulative value at which a unit completes.
    pub threshold: u64,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub tick_interval: Duration,

    /// Name of the span every unit span nests under.
    pub root_span: String,

    /// Units that get failure-path telemetry.
    pub fault_units: Vec<String>,

    /// Value of the `http.status_code` attribute on fault units.
    pub fault_status_code: u16,

    /// Seed for reproducible walks; OS entropy when unset.
    pub seed: Option<u64>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            units: DEFAULT_UNITS.iter().map(ToString::to_string).collect(),
            threshold: DEFAULT_THRESHOLD,
            tick_interval: DEFAULT_TICK_INTERVAL,
            root_span: DEFAULT_ROOT_SPAN.to_string(),
            fault_units: vec![DEFAULT_FAULT_UNIT.to_string()],
            fault_status_code: DEFAULT_FAULT_STATUS_CODE,
            seed: None,
        }
    }
}

impl HarnessConfig {
    pub fn fault_predicate(&self) -> FaultUnits {
        self.fault_units.iter().cloned().collect()
    }
}
