use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, Protocol, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use std::io;
use tracing::{Subscriber, debug, error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt::MakeWriter, layer::SubscriberExt, reload,
    util::SubscriberInitExt,
};

use crate::{
    config::{ExportProtocol, Signal, TelemetryConfig},
    error::TelemetryError,
    sink::LogLevel,
    telemetry::tls_config,
};

/// Target of the records the harness emits through a sink.
pub const LOG_TARGET: &str = "counter";

// The exporter stack logs through `tracing` too. Feeding those records back into
// the OTLP bridge would make every export produce more exports.
const BRIDGE_FILTER: &str =
    "info,opentelemetry=off,opentelemetry_sdk=off,opentelemetry_otlp=off,tonic=off,h2=off,hyper=off,reqwest=off,tower=off";

pub fn init_logs(
    config: &TelemetryConfig,
    resource: Resource,
) -> Result<SdkLoggerProvider, TelemetryError> {
    if !config.logs_enabled {
        info!("Log export is disabled, logs go to the console only");
        return Ok(SdkLoggerProvider::builder().with_resource(resource).build());
    }

    let endpoint = config.signal_endpoint(Signal::Logs);
    info!("Initializing logs with endpoint: {}", endpoint);

    let exporter = match config.protocol {
        ExportProtocol::Grpc => {
            let builder = LogExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .with_timeout(config.timeout);
            if config.insecure {
                builder.build()
            } else {
                builder.with_tls_config(tls_config()).build()
            }
        }
        ExportProtocol::HttpProtobuf => LogExporter::builder()
            .with_http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(endpoint)
            .with_timeout(config.timeout)
            .build(),
    }
    .map_err(|e| {
        error!("Failed to build log exporter: {}", e);
        TelemetryError::InitializationError(format!("log exporter: {}", e))
    })?;

    Ok(SdkLoggerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}

pub fn shutdown_logs(provider: &SdkLoggerProvider) -> Result<(), TelemetryError> {
    if let Err(e) = provider.force_flush() {
        warn!("Error flushing logs before shutdown: {}", e);
    }
    provider.shutdown().map_err(|e| {
        error!("Error shutting down logger provider: {}", e);
        TelemetryError::ShutdownError(format!("logger provider: {}", e))
    })
}

type BridgeSlot = Option<Box<dyn Layer<Registry> + Send + Sync>>;

/// Slot in the log subscriber that the OpenTelemetry bridge plugs into.
///
/// The console layer is live as soon as the subscriber exists, so diagnostics
/// from settings loading are not lost. The bridge is attached once a logger
/// provider has been built and detached before that provider shuts down.
#[derive(Clone)]
pub struct LogBridge {
    handle: reload::Handle<BridgeSlot, Registry>,
}

impl LogBridge {
    /// Starts bridging records into `provider`. The SDK attaches the active span
    /// context to each bridged record.
    pub fn attach(&self, provider: &SdkLoggerProvider) -> Result<(), TelemetryError> {
        let bridge: Box<dyn Layer<Registry> + Send + Sync> =
            Box::new(OpenTelemetryTracingBridge::new(provider));
        self.handle
            .modify(|slot| *slot = Some(bridge))
            .map_err(|e| TelemetryError::InitializationError(format!("log bridge: {}", e)))
    }

    pub fn detach(&self) {
        if let Err(e) = self.handle.modify(|slot| *slot = None) {
            debug!("log bridge already gone: {}", e);
        }
    }
}

/// Builds the `tracing` subscriber without installing it.
///
/// Console output goes to `writer`, filtered by `RUST_LOG` and falling back to
/// `log_level`. The returned [`LogBridge`] controls the OpenTelemetry layer.
pub fn build_log_subscriber<W>(
    log_level: &str,
    writer: W,
) -> (impl Subscriber + Send + Sync + 'static, LogBridge)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_filter(console_filter);

    let (bridge_layer, handle) = reload::Layer::new(BridgeSlot::None);

    let subscriber = tracing_subscriber::registry()
        .with(bridge_layer.with_filter(EnvFilter::new(BRIDGE_FILTER)))
        .with(console_layer);

    (subscriber, LogBridge { handle })
}

/// Installs the process-wide `tracing` subscriber, logging to stdout.
///
/// Installing twice is not an error, the first subscriber wins and `None` is
/// returned for the later calls.
pub fn setup_log_subscriber(log_level: &str) -> Option<LogBridge> {
    let (subscriber, bridge) = build_log_subscriber(log_level, io::stdout);

    match subscriber.try_init() {
        Ok(()) => Some(bridge),
        Err(e) => {
            debug!("log subscriber already installed: {}", e);
            None
        }
    }
}

/// Forwards a harness log record to `tracing` under [`LOG_TARGET`].
pub(crate) fn emit(level: LogLevel, message: &str) {
    match level {
        LogLevel::Debug => debug!(target: LOG_TARGET, "{}", message),
        LogLevel::Info => info!(target: LOG_TARGET, "{}", message),
        LogLevel::Warn => warn!(target: LOG_TARGET, "{}", message),
        LogLevel::Error => error!(target: LOG_TARGET, "{}", message),
    }
}
