use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Telemetry initialization error: {0}")]
    InitializationError(String),
    #[error("flushing telemetry: {0}")]
    FlushError(String),
    #[error("starting span {0}")]
    SpanError(String),
    #[error("shutting down {0}")]
    ShutdownError(String),
}
