use std::{collections::HashSet, io::Write, sync::Arc};
use tally_telemetry::{GaugeCell, TelemetrySink};
use tracing::info;

use crate::{
    config::HarnessConfig,
    error::HarnessError,
    fault::FaultPredicate,
    runner::{SpanGuard, SpanRunner, UnitReport},
    workload::{RandomSource, RandomWalkWorkload, RngSource},
};

/// Outcome of a full run, units in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub units: Vec<UnitReport>,
}

impl RunReport {
    pub fn total_ticks(&self) -> usize {
        self.units.iter().map(|u| u.ticks).sum()
    }
}

/// Top-level driver: one root span, units run sequentially beneath it.
pub struct Harness<S: TelemetrySink, R = RngSource> {
    sink: Arc<S>,
    runner: SpanRunner<S>,
    workload: RandomWalkWorkload<R>,
    gauge: GaugeCell,
    root_span: String,
}

impl<S: TelemetrySink> Harness<S, RngSource> {
    /// Harness drawing deltas from the configured seed, or from OS entropy.
    pub fn new(sink: Arc<S>, config: &HarnessConfig) -> Self {
        let source = match config.seed {
            Some(seed) => RngSource::seeded(seed),
            None => RngSource::from_entropy(),
        };
        Self::with_source(sink, config, source)
    }
}

impl<S: TelemetrySink, R: RandomSource> Harness<S, R> {
    /// Builds the harness and registers its gauge cell with the sink.
    pub fn with_source(sink: Arc<S>, config: &HarnessConfig, source: R) -> Self {
        let gauge = GaugeCell::new();
        sink.register_gauge(gauge.clone());

        Self {
            runner: SpanRunner::new(Arc::clone(&sink), gauge.clone(), config),
            sink,
            workload: RandomWalkWorkload::new(source),
            gauge,
            root_span: config.root_span.clone(),
        }
    }

    pub fn with_fault_predicate(mut self, fault: Arc<dyn FaultPredicate>) -> Self {
        self.runner.set_fault_predicate(fault);
        self
    }

    pub fn with_console(mut self, console: Box<dyn Write + Send>) -> Self {
        self.runner.set_console(console);
        self
    }

    pub const fn gauge(&self) -> &GaugeCell {
        &self.gauge
    }

    /// Runs every unit in order under the root span.
    ///
    /// The unit list is validated before any telemetry is emitted. The root span
    /// is ended when this returns, or during unwinding if a unit panics.
    pub fn run<N: AsRef<str>>(&mut self, unit_names: &[N]) -> Result<RunReport, HarnessError> {
        validate_unit_names(unit_names)?;

        let sink = Arc::clone(&self.sink);
        let root = SpanGuard::start(sink.as_ref(), &self.root_span, None);
        info!(
            "Running {} units under span {}",
            unit_names.len(),
            self.root_span
        );

        let units = unit_names
            .iter()
            .map(|name| {
                self.runner
                    .execute(name.as_ref(), &mut self.workload, root.span())
            })
            .collect::<Vec<_>>();

        drop(root);
        Ok(RunReport { units })
    }
}

/// Rejects empty and duplicate unit names.
pub fn validate_unit_names<N: AsRef<str>>(unit_names: &[N]) -> Result<(), HarnessError> {
    let mut seen = HashSet::new();
    for name in unit_names {
        let name = name.as_ref();
        if name.trim().is_empty() {
            return Err(HarnessError::InvalidUnit("unit names must not be empty".to_string()));
        }
        if !seen.insert(name) {
            return Err(HarnessError::InvalidUnit(format!("duplicate unit name '{}'", name)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_unit_names() {
        assert!(validate_unit_names(&["first-child", "second-child"]).is_ok());
        assert!(validate_unit_names::<&str>(&[]).is_ok());

        assert_eq!(
            validate_unit_names(&["first-child", "first-child"]),
            Err(HarnessError::InvalidUnit(
                "duplicate unit name 'first-child'".to_string()
            ))
        );
        assert!(validate_unit_names(&["first-child", " "]).is_err());
    }
}
