use opentelemetry::KeyValue;
use parking_lot::Mutex;

use crate::{
    error::TelemetryError,
    gauge::GaugeCell,
    sink::{LogLevel, TelemetryEvent, TelemetrySink},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(u64);

/// A span as seen by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpanRecord {
    pub id: SpanId,
    pub name: String,
    pub parent: Option<SpanId>,
    pub attributes: Vec<KeyValue>,
    pub events: Vec<String>,
    pub ended: bool,
}

impl SpanRecord {
    pub fn attribute(&self, key: &str) -> Option<&KeyValue> {
        self.attributes.iter().find(|kv| kv.key.as_str() == key)
    }
}

#[derive(Debug, Default)]
struct Recorded {
    next_span: u64,
    spans: Vec<SpanRecord>,
    events: Vec<TelemetryEvent>,
    flushes: usize,
    gauges: Vec<GaugeCell>,
}

/// In-memory sink that keeps everything it is handed.
///
/// Each flush stands in for an export cycle: registered gauges are sampled and
/// recorded as [`TelemetryEvent::GaugeObservation`].
#[derive(Debug, Default)]
pub struct RecordingSink {
    state: Mutex<Recorded>,
    fail_span_start: bool,
    fail_flush: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `start_span` call fails.
    pub fn with_failing_spans(mut self) -> Self {
        self.fail_span_start = true;
        self
    }

    /// Every flush is recorded, then reported as timed out.
    pub fn with_failing_flush(mut self) -> Self {
        self.fail_flush = true;
        self
    }

    pub fn spans(&self) -> Vec<SpanRecord> {
        self.state.lock().spans.clone()
    }

    pub fn span_named(&self, name: &str) -> Option<SpanRecord> {
        self.state.lock().spans.iter().find(|s| s.name == name).cloned()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.state.lock().events.clone()
    }

    pub fn flush_count(&self) -> usize {
        self.state.lock().flushes
    }

    pub fn gauge_count(&self) -> usize {
        self.state.lock().gauges.len()
    }

    pub fn logs(&self) -> Vec<(LogLevel, String)> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|event| match event {
                TelemetryEvent::LogRecord { level, message } => Some((*level, message.clone())),
                _ => None,
            })
            .collect()
    }

    /// Sum of every counter increment.
    pub fn counter_total(&self) -> u64 {
        self.state
            .lock()
            .events
            .iter()
            .map(|event| match event {
                TelemetryEvent::CounterAdd { amount, .. } => *amount,
                _ => 0,
            })
            .sum()
    }

    pub fn gauge_observations(&self) -> Vec<u64> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|event| match event {
                TelemetryEvent::GaugeObservation { value } => Some(*value),
                _ => None,
            })
            .collect()
    }

    fn with_span(&self, id: SpanId, f: impl FnOnce(&mut SpanRecord)) {
        let mut state = self.state.lock();
        if let Some(span) = state.spans.iter_mut().find(|s| s.id == id) {
            f(span);
        }
    }
}

impl TelemetrySink for RecordingSink {
    type Span = SpanId;

    fn start_span(&self, name: &str, parent: Option<&SpanId>) -> Result<SpanId, TelemetryError> {
        if self.fail_span_start {
            return Err(TelemetryError::SpanError(name.to_string()));
        }

        let mut state = self.state.lock();
        let id = SpanId(state.next_span);
        state.next_span += 1;
        state.spans.push(SpanRecord {
            id,
            name: name.to_string(),
            parent: parent.copied(),
            attributes: Vec::new(),
            events: Vec::new(),
            ended: false,
        });
        Ok(id)
    }

    fn set_span_attribute(&self, span: &SpanId, attribute: KeyValue) {
        self.with_span(*span, |record| record.attributes.push(attribute));
    }

    fn add_span_event(&self, span: &SpanId, name: &str) {
        self.with_span(*span, |record| record.events.push(name.to_string()));
        self.state.lock().events.push(TelemetryEvent::SpanEvent {
            name: name.to_string(),
        });
    }

    fn end_span(&self, span: SpanId) {
        self.with_span(span, |record| record.ended = true);
    }

    fn add_counter(&self, amount: u64, attributes: &[KeyValue]) {
        self.state.lock().events.push(TelemetryEvent::CounterAdd {
            amount,
            attributes: attributes.to_vec(),
        });
    }

    fn register_gauge(&self, cell: GaugeCell) {
        self.state.lock().gauges.push(cell);
    }

    fn emit_log(&self, level: LogLevel, message: &str, _span: Option<&SpanId>) {
        self.state.lock().events.push(TelemetryEvent::LogRecord {
            level,
            message: message.to_string(),
        });
    }

    fn force_flush(&self) -> Result<(), TelemetryError> {
        let mut state = self.state.lock();
        state.flushes += 1;
        let observations = state
            .gauges
            .iter()
            .map(|cell| TelemetryEvent::GaugeObservation { value: cell.get() })
            .collect::<Vec<_>>();
        state.events.extend(observations);

        if self.fail_flush {
            return Err(TelemetryError::FlushError("export timed out".to_string()));
        }
        Ok(())
    }
}
