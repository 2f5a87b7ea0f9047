use opentelemetry::KeyValue;
use std::fmt;

use crate::{error::TelemetryError, gauge::GaugeCell};

/// Severity of a structured log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// An immutable fact handed to a sink. Producers keep no reference to it.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    CounterAdd { amount: u64, attributes: Vec<KeyValue> },
    GaugeObservation { value: u64 },
    LogRecord { level: LogLevel, message: String },
    SpanEvent { name: String },
}

/// Backend the harness emits telemetry into.
///
/// Emission calls are fire-and-forget. Only [`TelemetrySink::start_span`] and
/// [`TelemetrySink::force_flush`] report failures, and callers are expected to
/// log and carry on: telemetry never decides whether the workload completes.
pub trait TelemetrySink: Send + Sync {
    /// Handle to an open span. Ownership of the handle is ownership of the span.
    type Span;

    /// Opens a span, nested under `parent` when given.
    fn start_span(&self, name: &str, parent: Option<&Self::Span>)
    -> Result<Self::Span, TelemetryError>;

    fn set_span_attribute(&self, span: &Self::Span, attribute: KeyValue);

    fn add_span_event(&self, span: &Self::Span, name: &str);

    /// Closes the span. Consumes the handle so a span is ended at most once.
    fn end_span(&self, span: Self::Span);

    fn add_counter(&self, amount: u64, attributes: &[KeyValue]);

    /// Registers a pull-based gauge. The sink samples the cell during its own
    /// export cycle; the caller only ever writes to it.
    fn register_gauge(&self, cell: GaugeCell);

    /// Emits a log record, correlated with `span` when given.
    fn emit_log(&self, level: LogLevel, message: &str, span: Option<&Self::Span>);

    /// Pushes buffered telemetry, bounded by the sink's export timeout.
    fn force_flush(&self) -> Result<(), TelemetryError>;
}
