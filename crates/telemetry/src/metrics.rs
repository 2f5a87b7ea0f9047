use opentelemetry::metrics::{Counter, Meter, ObservableGauge};
use opentelemetry_otlp::{MetricExporter, Protocol, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use parking_lot::Mutex;
use tracing::{error, info};

use crate::{
    config::{ExportProtocol, Signal, TelemetryConfig},
    error::TelemetryError,
    gauge::GaugeCell,
    telemetry::tls_config,
};

pub const METER_NAME: &str = "counter.metrics";

pub const COUNTER_NAME: &str = "test.obs_counter";
pub const COUNTER_UNIT: &str = "1";
pub const COUNTER_DESCRIPTION: &str = "Keeps track of the counter";

pub const GAUGE_NAME: &str = "test.obs_gauge";
pub const GAUGE_DESCRIPTION: &str = "Latest delta applied to the counter";

pub fn init_metrics(
    config: &TelemetryConfig,
    resource: Resource,
) -> Result<SdkMeterProvider, TelemetryError> {
    if !config.metrics_enabled {
        info!("Metrics export is disabled, instruments will record locally only");
        return Ok(SdkMeterProvider::builder().with_resource(resource).build());
    }

    let endpoint = config.signal_endpoint(Signal::Metrics);
    info!(
        "Initializing metrics with endpoint: {} ({})",
        endpoint, config.protocol
    );

    let exporter = match config.protocol {
        ExportProtocol::Grpc => {
            let builder = MetricExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .with_timeout(config.timeout);
            if config.insecure {
                builder.build()
            } else {
                builder.with_tls_config(tls_config()).build()
            }
        }
        ExportProtocol::HttpProtobuf => MetricExporter::builder()
            .with_http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(endpoint)
            .with_timeout(config.timeout)
            .build(),
    }
    .map_err(|e| {
        error!(
            "Failed to build metric exporter: {}. Metrics will not be sent to backend.",
            e
        );
        TelemetryError::InitializationError(format!("metric exporter: {}", e))
    })?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(config.export_interval)
        .build();

    Ok(SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource)
        .build())
}

/// Instruments owned by the OTLP sink.
///
/// Observable gauges are only sampled while their handle is alive, so every
/// registered gauge is kept here until the sink is dropped.
pub struct CounterInstruments {
    meter: Meter,
    pub counter: Counter<u64>,
    gauges: Mutex<Vec<ObservableGauge<u64>>>,
}

impl CounterInstruments {
    pub fn new(meter: Meter) -> Self {
        let counter = meter
            .u64_counter(COUNTER_NAME)
            .with_unit(COUNTER_UNIT)
            .with_description(COUNTER_DESCRIPTION)
            .build();

        Self {
            meter,
            counter,
            gauges: Mutex::new(Vec::new()),
        }
    }

    pub fn register_gauge(&self, cell: GaugeCell) {
        let gauge = self
            .meter
            .u64_observable_gauge(GAUGE_NAME)
            .with_description(GAUGE_DESCRIPTION)
            .with_callback(move |observer| observer.observe(cell.get(), &[]))
            .build();
        self.gauges.lock().push(gauge);
    }

    pub fn gauge_count(&self) -> usize {
        self.gauges.lock().len()
    }
}

pub fn shutdown_metrics(provider: &SdkMeterProvider) -> Result<(), TelemetryError> {
    provider.shutdown().map_err(|e| {
        error!("Error shutting down meter provider: {}", e);
        TelemetryError::ShutdownError(format!("meter provider: {}", e))
    })
}
