use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::{error, info};

use crate::{
    config::{ExportProtocol, Signal, TelemetryConfig},
    error::TelemetryError,
    telemetry::tls_config,
};

pub const TRACER_NAME: &str = "counter.traces";

pub fn init_traces(
    config: &TelemetryConfig,
    resource: Resource,
) -> Result<SdkTracerProvider, TelemetryError> {
    if !config.traces_enabled {
        info!("Trace export is disabled, spans will not leave the process");
        return Ok(SdkTracerProvider::builder().with_resource(resource).build());
    }

    let endpoint = config.signal_endpoint(Signal::Traces);
    info!("Initializing traces with endpoint: {}", endpoint);

    let exporter = match config.protocol {
        ExportProtocol::Grpc => {
            let builder = SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .with_timeout(config.timeout);
            if config.insecure {
                builder.build()
            } else {
                builder.with_tls_config(tls_config()).build()
            }
        }
        ExportProtocol::HttpProtobuf => SpanExporter::builder()
            .with_http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(endpoint)
            .with_timeout(config.timeout)
            .build(),
    }
    .map_err(|e| {
        error!("Failed to build span exporter: {}", e);
        TelemetryError::InitializationError(format!("span exporter: {}", e))
    })?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}

pub fn shutdown_traces(provider: &SdkTracerProvider) -> Result<(), TelemetryError> {
    if let Err(e) = provider.force_flush() {
        tracing::warn!("Error flushing spans before shutdown: {}", e);
    }
    provider.shutdown().map_err(|e| {
        error!("Error shutting down tracer provider: {}", e);
        TelemetryError::ShutdownError(format!("tracer provider: {}", e))
    })
}
