use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tonic::transport::ClientTlsConfig;
use tracing::{info, warn};

use crate::{
    config::TelemetryConfig,
    error::TelemetryError,
    logs::{init_logs, shutdown_logs},
    metrics::{init_metrics, shutdown_metrics},
    traces::{init_traces, shutdown_traces},
};

/// The three SDK providers backing an OTLP sink.
pub struct Providers {
    pub meter: SdkMeterProvider,
    pub tracer: SdkTracerProvider,
    pub logger: SdkLoggerProvider,
}

pub fn init_telemetry(
    config: &TelemetryConfig,
    resource: Resource,
) -> Result<Providers, TelemetryError> {
    info!(
        "Initializing telemetry with configuration: metrics_enabled={}, traces_enabled={}, logs_enabled={}",
        config.metrics_enabled, config.traces_enabled, config.logs_enabled
    );

    let meter = init_metrics(config, resource.clone())?;
    let tracer = init_traces(config, resource.clone())?;
    let logger = init_logs(config, resource)?;

    info!("Telemetry initialization completed successfully");
    Ok(Providers {
        meter,
        tracer,
        logger,
    })
}

/// Flushes and shuts down every provider. Failures are logged, not returned.
pub fn shutdown_telemetry(providers: &Providers) {
    info!("Shutting down telemetry");

    if let Err(e) = shutdown_metrics(&providers.meter) {
        warn!("Error shutting down metrics: {}", e);
    }
    if let Err(e) = shutdown_traces(&providers.tracer) {
        warn!("Error shutting down traces: {}", e);
    }
    if let Err(e) = shutdown_logs(&providers.logger) {
        warn!("Error shutting down logs: {}", e);
    }
}

/// Builds the resource shared by all signals: service identity plus extra labels.
pub fn build_resource(config: &TelemetryConfig) -> Resource {
    let mut labels = config.labels.iter().collect::<Vec<_>>();
    labels.sort();

    let mut resource_builder = Resource::builder()
        .with_service_name(config.service.name.clone())
        .with_attribute(KeyValue::new(
            "deployment.environment",
            config.service.environment.clone(),
        ))
        .with_attribute(KeyValue::new(
            "service.version",
            config.service.version.clone(),
        ));

    for (key, value) in labels {
        resource_builder = resource_builder.with_attribute(KeyValue::new(key.clone(), value.clone()));
    }

    resource_builder.build()
}

pub(crate) fn tls_config() -> ClientTlsConfig {
    ClientTlsConfig::new().with_native_roots()
}
