use opentelemetry::KeyValue;
use std::{
    io::{self, Write},
    sync::Arc,
    thread,
    time::Duration,
};
use tally_telemetry::{GaugeCell, LogLevel, TelemetrySink};
use tracing::{debug, trace, warn};

use crate::{
    config::HarnessConfig,
    fault::{ERROR_ATTRIBUTE, FAULT_EVENT, FaultPredicate, STATUS_CODE_ATTRIBUTE},
    workload::{RandomSource, RandomWalkWorkload, Step},
};

pub const COUNTER_TYPE_KEY: &str = "test.type";
pub const COUNTER_TYPE_VALUE: &str = "Counter";

/// Owns an open span and ends it when dropped, unwinding included.
///
/// If the sink refused to start the span the guard is empty and every call on
/// it is a no-op apart from logging.
pub struct SpanGuard<'a, S: TelemetrySink> {
    sink: &'a S,
    span: Option<S::Span>,
}

impl<'a, S: TelemetrySink> SpanGuard<'a, S> {
    pub fn start(sink: &'a S, name: &str, parent: Option<&S::Span>) -> Self {
        let span = match sink.start_span(name, parent) {
            Ok(span) => Some(span),
            Err(e) => {
                warn!("Failed to start span {}: {}. Continuing without it", name, e);
                None
            }
        };
        Self { sink, span }
    }

    pub const fn span(&self) -> Option<&S::Span> {
        self.span.as_ref()
    }

    pub fn set_attribute(&self, attribute: KeyValue) {
        if let Some(span) = &self.span {
            self.sink.set_span_attribute(span, attribute);
        }
    }

    pub fn add_event(&self, name: &str) {
        if let Some(span) = &self.span {
            self.sink.add_span_event(span, name);
        }
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        self.sink.emit_log(level, message, self.span.as_ref());
    }
}

impl<S: TelemetrySink> Drop for SpanGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(span) = self.span.take() {
            self.sink.end_span(span);
        }
    }
}

/// Outcome of one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub name: String,
    pub ticks: usize,
    pub total: u64,
    /// Whether failure-path telemetry was attached.
    pub faulted: bool,
}

/// Runs one unit of work inside its own span.
pub struct SpanRunner<S: TelemetrySink> {
    sink: Arc<S>,
    gauge: GaugeCell,
    fault: Arc<dyn FaultPredicate>,
    threshold: u64,
    tick_interval: Duration,
    fault_status_code: u16,
    console: Box<dyn Write + Send>,
}

impl<S: TelemetrySink> SpanRunner<S> {
    pub fn new(sink: Arc<S>, gauge: GaugeCell, config: &HarnessConfig) -> Self {
        Self {
            sink,
            gauge,
            fault: Arc::new(config.fault_predicate()),
            threshold: config.threshold,
            tick_interval: config.tick_interval,
            fault_status_code: config.fault_status_code,
            console: Box::new(io::stdout()),
        }
    }

    pub(crate) fn set_fault_predicate(&mut self, fault: Arc<dyn FaultPredicate>) {
        self.fault = fault;
    }

    /// Redirects the per-tick console lines.
    pub(crate) fn set_console(&mut self, console: Box<dyn Write + Send>) {
        self.console = console;
    }

    /// Runs `unit_name` to completion under a span nested in `parent`.
    ///
    /// Telemetry failures are logged and otherwise ignored; the walk always runs
    /// to the threshold. The span is ended on every path out of this function.
    pub fn execute<R: RandomSource>(
        &mut self,
        unit_name: &str,
        workload: &mut RandomWalkWorkload<R>,
        parent: Option<&S::Span>,
    ) -> UnitReport {
        let sink = Arc::clone(&self.sink);
        let span = SpanGuard::start(sink.as_ref(), unit_name, parent);

        span.log(LogLevel::Info, &format!("Starting {}", unit_name));

        let mut ticks = 0;
        let mut total = 0;
        for step in workload.run(self.threshold) {
            self.tick(unit_name, step);
            ticks += 1;
            total = step.cumulative;
        }

        span.log(LogLevel::Info, &format!("Completed {}", unit_name));

        let faulted = self.fault.is_fault_unit(unit_name);
        if faulted {
            span.set_attribute(KeyValue::new(ERROR_ATTRIBUTE, true));
            span.set_attribute(KeyValue::new(
                STATUS_CODE_ATTRIBUTE,
                i64::from(self.fault_status_code),
            ));
            span.add_event(FAULT_EVENT);
            span.log(
                LogLevel::Error,
                &format!("{} in {}", FAULT_EVENT, unit_name),
            );
        }

        UnitReport {
            name: unit_name.to_string(),
            ticks,
            total,
            faulted,
        }
    }

    fn tick(&mut self, unit_name: &str, step: Step) {
        trace!("{}: delta={} cumulative={}", unit_name, step.delta, step.cumulative);

        self.sink.add_counter(
            step.delta,
            &[KeyValue::new(COUNTER_TYPE_KEY, COUNTER_TYPE_VALUE)],
        );
        self.gauge.set(step.delta);

        if let Err(e) = writeln!(
            self.console,
            "Span: {}\tDelta: {}\tCounter: {}",
            unit_name, step.delta, step.cumulative
        ) {
            warn!("Failed to write tick to console: {}", e);
        }

        if let Err(e) = self.sink.force_flush() {
            debug!("Ignoring telemetry flush failure: {}", e);
        }

        thread::sleep(self.tick_interval);
    }
}
