use opentelemetry::{
    Context, KeyValue,
    metrics::MeterProvider as _,
    trace::{TraceContextExt, Tracer, TracerProvider as _},
};
use opentelemetry_sdk::trace::SdkTracer;
use tracing::debug;

use crate::{
    error::TelemetryError,
    gauge::GaugeCell,
    logs,
    metrics::{CounterInstruments, METER_NAME},
    sink::{LogLevel, TelemetrySink},
    telemetry::{Providers, shutdown_telemetry},
    traces::TRACER_NAME,
};

/// An open span, carried inside the context it was started in.
///
/// Keeping the whole [`Context`] lets children nest under it and lets log
/// records emitted on its behalf pick up its trace and span ids.
#[derive(Debug, Clone)]
pub struct OtelSpan {
    cx: Context,
}

impl OtelSpan {
    pub fn context(&self) -> &Context {
        &self.cx
    }
}

/// [`TelemetrySink`] backed by the OpenTelemetry SDK and OTLP exporters.
pub struct OtelSink {
    providers: Providers,
    tracer: SdkTracer,
    instruments: CounterInstruments,
}

impl OtelSink {
    pub fn new(providers: Providers) -> Self {
        let tracer = providers.tracer.tracer(TRACER_NAME);
        let instruments = CounterInstruments::new(providers.meter.meter(METER_NAME));
        Self {
            providers,
            tracer,
            instruments,
        }
    }

    /// Flushes every signal and shuts the providers down. Errors are logged.
    pub fn shutdown(&self) {
        shutdown_telemetry(&self.providers);
    }
}

impl TelemetrySink for OtelSink {
    type Span = OtelSpan;

    fn start_span(&self, name: &str, parent: Option<&OtelSpan>) -> Result<OtelSpan, TelemetryError> {
        let parent_cx = parent.map_or_else(Context::new, |p| p.cx.clone());
        let span = self.tracer.start_with_context(name.to_string(), &parent_cx);
        Ok(OtelSpan {
            cx: parent_cx.with_span(span),
        })
    }

    fn set_span_attribute(&self, span: &OtelSpan, attribute: KeyValue) {
        span.cx.span().set_attribute(attribute);
    }

    fn add_span_event(&self, span: &OtelSpan, name: &str) {
        span.cx.span().add_event(name.to_string(), Vec::new());
    }

    fn end_span(&self, span: OtelSpan) {
        span.cx.span().end();
    }

    fn add_counter(&self, amount: u64, attributes: &[KeyValue]) {
        self.instruments.counter.add(amount, attributes);
    }

    fn register_gauge(&self, cell: GaugeCell) {
        self.instruments.register_gauge(cell);
    }

    fn emit_log(&self, level: LogLevel, message: &str, span: Option<&OtelSpan>) {
        let _guard = span.map(|s| s.cx.clone().attach());
        logs::emit(level, message);
    }

    fn force_flush(&self) -> Result<(), TelemetryError> {
        // Only metrics are pushed per call; spans and logs keep their batching.
        self.providers.meter.force_flush().map_err(|e| {
            debug!("metric flush failed: {}", e);
            TelemetryError::FlushError(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::TelemetryConfig,
        metrics::{COUNTER_NAME, GAUGE_NAME},
        telemetry::{build_resource, init_telemetry},
    };
    use opentelemetry::trace::SpanContext;
    use opentelemetry_sdk::{
        logs::SdkLoggerProvider,
        metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider},
        trace::{InMemorySpanExporter, SdkTracerProvider},
    };

    fn disabled_sink() -> OtelSink {
        let config = TelemetryConfig::disabled();
        OtelSink::new(init_telemetry(&config, build_resource(&config)).unwrap())
    }

    fn in_memory_sink() -> (OtelSink, InMemorySpanExporter, InMemoryMetricExporter) {
        let spans = InMemorySpanExporter::default();
        let metrics = InMemoryMetricExporter::default();
        let providers = Providers {
            meter: SdkMeterProvider::builder()
                .with_reader(PeriodicReader::builder(metrics.clone()).build())
                .build(),
            tracer: SdkTracerProvider::builder()
                .with_simple_exporter(spans.clone())
                .build(),
            logger: SdkLoggerProvider::builder().build(),
        };
        (OtelSink::new(providers), spans, metrics)
    }

    fn span_context(span: &OtelSpan) -> SpanContext {
        span.context().span().span_context().clone()
    }

    #[test]
    fn test_child_span_shares_trace_with_parent() {
        let sink = disabled_sink();

        let parent = sink.start_span("parent", None).unwrap();
        let child = sink.start_span("first-child", Some(&parent)).unwrap();

        let parent_cx = span_context(&parent);
        let child_cx = span_context(&child);
        assert!(parent_cx.is_valid());
        assert_eq!(parent_cx.trace_id(), child_cx.trace_id());
        assert_ne!(parent_cx.span_id(), child_cx.span_id());

        sink.end_span(child);
        sink.end_span(parent);
        sink.shutdown();
    }

    #[test]
    fn test_root_spans_start_new_traces() {
        let sink = disabled_sink();

        let first = sink.start_span("parent", None).unwrap();
        let second = sink.start_span("parent", None).unwrap();
        assert_ne!(span_context(&first).trace_id(), span_context(&second).trace_id());

        sink.end_span(first);
        sink.end_span(second);
    }

    #[test]
    fn test_ended_spans_are_exported_with_fault_marks() {
        let (sink, spans, _) = in_memory_sink();

        let parent = sink.start_span("parent", None).unwrap();
        let child = sink.start_span("second-child", Some(&parent)).unwrap();
        let parent_id = span_context(&parent).span_id();

        sink.set_span_attribute(&child, KeyValue::new("error", true));
        sink.add_span_event(&child, "API failure detected");
        sink.end_span(child);
        sink.end_span(parent);

        let finished = spans.get_finished_spans().unwrap();
        assert_eq!(finished.len(), 2);

        let child = &finished[0];
        assert_eq!(child.name, "second-child");
        assert_eq!(child.parent_span_id, parent_id);
        assert!(child.attributes.contains(&KeyValue::new("error", true)));
        let events: Vec<_> = child.events.iter().map(|e| e.name.as_ref()).collect();
        assert_eq!(events, vec!["API failure detected"]);

        let parent = &finished[1];
        assert_eq!(parent.name, "parent");
        assert_eq!(parent.span_context.span_id(), parent_id);
        assert!(parent.attributes.is_empty());
    }

    #[test]
    fn test_force_flush_exports_counter_and_gauge() {
        let (sink, _, metrics) = in_memory_sink();
        let cell = GaugeCell::new();
        sink.register_gauge(cell.clone());
        cell.set(4);
        sink.add_counter(4, &[KeyValue::new("test.type", "Counter")]);

        sink.force_flush().unwrap();

        let exported = metrics.get_finished_metrics().unwrap();
        let names: Vec<String> = exported
            .iter()
            .flat_map(|rm| rm.scope_metrics.iter())
            .flat_map(|sm| sm.metrics.iter())
            .map(|m| m.name.to_string())
            .collect();
        assert!(names.iter().any(|n| n == COUNTER_NAME), "exported: {:?}", names);
        assert!(names.iter().any(|n| n == GAUGE_NAME), "exported: {:?}", names);
    }

    #[test]
    fn test_metrics_calls_with_no_exporter() {
        let sink = disabled_sink();
        let cell = GaugeCell::new();
        sink.register_gauge(cell.clone());
        cell.set(4);
        sink.add_counter(4, &[KeyValue::new("test.type", "Counter")]);

        // no reader registered, flushing has nothing to do
        assert!(sink.force_flush().is_ok());
        sink.shutdown();
    }
}
