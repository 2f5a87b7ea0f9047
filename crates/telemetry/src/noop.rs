use opentelemetry::KeyValue;

use crate::{
    error::TelemetryError,
    gauge::GaugeCell,
    logs,
    sink::{LogLevel, TelemetrySink},
};

/// Sink for the uninstrumented baseline: spans, metrics and flushes are dropped,
/// log records still reach the console through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    type Span = ();

    fn start_span(&self, _name: &str, _parent: Option<&()>) -> Result<(), TelemetryError> {
        Ok(())
    }

    fn set_span_attribute(&self, _span: &(), _attribute: KeyValue) {}

    fn add_span_event(&self, _span: &(), _name: &str) {}

    fn end_span(&self, _span: ()) {}

    fn add_counter(&self, _amount: u64, _attributes: &[KeyValue]) {}

    fn register_gauge(&self, _cell: GaugeCell) {}

    fn emit_log(&self, level: LogLevel, message: &str, _span: Option<&()>) {
        logs::emit(level, message);
    }

    fn force_flush(&self) -> Result<(), TelemetryError> {
        Ok(())
    }
}
