//! # Tally Telemetry
//!
//! Telemetry backends for the tally harness. Everything the harness emits goes
//! through the [`TelemetrySink`] trait:
//! - **Counters** and a pull-based **observable gauge** backed by a [`GaugeCell`]
//! - **Spans** with parent nesting, attributes and events
//! - **Structured logs** correlated with the span they were emitted for
//! - **Flush** requests bounded by the exporter timeout
//!
//! [`OtelSink`] exports over OTLP (gRPC or HTTP/protobuf), [`NoopSink`] is the
//! uninstrumented baseline, and `RecordingSink` (tests, or the `test_utils`
//! feature) keeps everything in memory.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tally_telemetry::{TelemetryConfig, TelemetrySink, create_telemetry, setup_log_subscriber};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Console logging is live before anything else runs
//!     let log_bridge = setup_log_subscriber("info");
//!     let telemetry = create_telemetry(&TelemetryConfig::default(), log_bridge.as_ref())?;
//!
//!     let sink = telemetry.sink();
//!     let span = sink.start_span("parent", None)?;
//!     sink.end_span(span);
//!
//!     // Flush and shut down the providers when done
//!     telemetry.shutdown();
//!     Ok(())
//! }
//! ```

pub mod config;
mod error;
mod factory;
pub mod gauge;
pub mod logs;
pub mod metrics;
mod noop;
mod otel;
pub mod sink;
pub mod telemetry;
#[cfg(any(test, feature = "test_utils"))]
pub mod testing;
pub mod traces;

pub use config::{ExportProtocol, ServiceConfig, TelemetryConfig};
pub use error::TelemetryError;
pub use factory::{TelemetryInstance, create_telemetry};
pub use gauge::GaugeCell;
pub use logs::{LogBridge, setup_log_subscriber};
pub use noop::NoopSink;
pub use otel::{OtelSink, OtelSpan};
pub use sink::{LogLevel, TelemetryEvent, TelemetrySink};
