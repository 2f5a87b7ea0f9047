use std::sync::Arc;

use crate::{
    config::TelemetryConfig,
    error::TelemetryError,
    logs::LogBridge,
    otel::OtelSink,
    telemetry::{build_resource, init_telemetry},
};

/// An active telemetry system for one harness run.
///
/// Owns the OTLP sink and its providers. It should be created once before the
/// workload starts and shut down after it ends so buffered spans and logs are
/// flushed to the collector.
pub struct TelemetryInstance {
    /// Configuration used to initialize this telemetry instance.
    config: TelemetryConfig,

    sink: Arc<OtelSink>,

    log_bridge: Option<LogBridge>,
}

impl TelemetryInstance {
    pub fn sink(&self) -> Arc<OtelSink> {
        Arc::clone(&self.sink)
    }

    pub const fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Gracefully shuts down the telemetry system, flushing all pending data.
    /// Blocks for at most the configured export timeout per signal.
    pub fn shutdown(self) {
        if let Some(bridge) = &self.log_bridge {
            bridge.detach();
        }
        self.sink.shutdown();
    }
}

/// Creates the telemetry system and attaches the OTLP log bridge to the
/// subscriber installed by [`crate::logs::setup_log_subscriber`].
///
/// Must be called from within a tokio runtime when the gRPC protocol is
/// selected, the tonic channel is bound to the runtime it was created on.
/// Connection problems do not fail this call; exports are attempted lazily and
/// failures are reported through the SDK's own diagnostics.
pub fn create_telemetry(
    telemetry_config: &TelemetryConfig,
    log_bridge: Option<&LogBridge>,
) -> Result<TelemetryInstance, TelemetryError> {
    let resource = build_resource(telemetry_config);

    let providers = init_telemetry(telemetry_config, resource).map_err(|e| {
        TelemetryError::InitializationError(format!("Failed to initialize telemetry: {}", e))
    })?;

    // Bridge only when logs are exported, otherwise the console is enough
    let log_bridge = match log_bridge {
        Some(bridge) if telemetry_config.logs_enabled => {
            bridge.attach(&providers.logger)?;
            Some(bridge.clone())
        }
        _ => None,
    };

    Ok(TelemetryInstance {
        config: telemetry_config.clone(),
        sink: Arc::new(OtelSink::new(providers)),
        log_bridge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::TelemetrySink;

    #[test]
    fn test_telemetry_instance_creation() {
        let config = TelemetryConfig::disabled();

        let result = create_telemetry(&config, None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_telemetry_instance_shutdown() {
        let config = TelemetryConfig::disabled();

        let instance = create_telemetry(&config, None).unwrap();
        assert_eq!(instance.config(), &config);

        let sink = instance.sink();
        let span = sink.start_span("parent", None).unwrap();
        sink.end_span(span);

        // Should not panic on shutdown
        instance.shutdown();
    }

    #[test]
    fn test_bridge_left_detached_when_logs_disabled() {
        let (_subscriber, bridge) = crate::logs::build_log_subscriber("info", std::io::sink);
        let config = TelemetryConfig::disabled();

        let instance = create_telemetry(&config, Some(&bridge)).unwrap();
        assert!(instance.log_bridge.is_none());
        instance.shutdown();
    }
}
