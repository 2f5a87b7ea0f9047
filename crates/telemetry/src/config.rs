use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use std::{collections::HashMap, fmt, str::FromStr, time::Duration};

/// Default OTLP collector address, without scheme.
pub const DEFAULT_OTLP_ENDPOINT: &str = "localhost:4317";

/// Default timeout applied to every export request.
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default period of the metric reader's export cycle.
pub const DEFAULT_EXPORT_INTERVAL: Duration = Duration::from_secs(60);

/// Wire protocol used by the OTLP exporters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportProtocol {
    /// OTLP over gRPC (tonic), usually port 4317
    #[default]
    Grpc,
    /// OTLP over HTTP with protobuf bodies, usually port 4318
    HttpProtobuf,
}

impl fmt::Display for ExportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grpc => write!(f, "grpc"),
            Self::HttpProtobuf => write!(f, "http-protobuf"),
        }
    }
}

impl FromStr for ExportProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grpc" => Ok(Self::Grpc),
            "http" | "http-protobuf" | "http/protobuf" => Ok(Self::HttpProtobuf),
            other => Err(format!("unknown export protocol '{}'", other)),
        }
    }
}

/// The telemetry signals, used to derive per-signal HTTP endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Metrics,
    Traces,
    Logs,
}

impl Signal {
    const fn path(self) -> &'static str {
        match self {
            Self::Metrics => "v1/metrics",
            Self::Traces => "v1/traces",
            Self::Logs => "v1/logs",
        }
    }
}

/// Service identity attached to all emitted telemetry as resource attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// `service.name`
    pub name: String,
    /// `deployment.environment`
    pub environment: String,
    /// `service.version`
    pub version: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "tally".to_string(),
            environment: "local".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Configuration for the OTLP-backed telemetry sink.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Collector endpoint. A scheme is added when missing, see [`TelemetryConfig::base_url`].
    pub endpoint: String,

    pub protocol: ExportProtocol,

    /// Plaintext transport when true, TLS otherwise.
    pub insecure: bool,

    /// Upper bound on a single export (and therefore on a flush).
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,

    /// Period of the metric reader. The observable gauge is sampled once per cycle.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub export_interval: Duration,

    pub metrics_enabled: bool,
    pub traces_enabled: bool,
    pub logs_enabled: bool,

    pub service: ServiceConfig,

    /// Extra resource attributes.
    pub labels: HashMap<String, String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
            protocol: ExportProtocol::default(),
            insecure: true,
            timeout: DEFAULT_EXPORT_TIMEOUT,
            export_interval: DEFAULT_EXPORT_INTERVAL,
            metrics_enabled: true,
            traces_enabled: true,
            logs_enabled: true,
            service: ServiceConfig::default(),
            labels: HashMap::new(),
        }
    }
}

impl TelemetryConfig {
    /// Config with every exporter switched off. Providers are still built, they just
    /// never push anywhere.
    pub fn disabled() -> Self {
        Self {
            metrics_enabled: false,
            traces_enabled: false,
            logs_enabled: false,
            ..Self::default()
        }
    }

    pub const fn any_signal_enabled(&self) -> bool {
        self.metrics_enabled || self.traces_enabled || self.logs_enabled
    }

    /// The endpoint with a scheme matching the transport security flag.
    pub fn base_url(&self) -> String {
        let endpoint = self.endpoint.trim();
        if endpoint.contains("://") {
            endpoint.to_string()
        } else if self.insecure {
            format!("http://{}", endpoint)
        } else {
            format!("https://{}", endpoint)
        }
    }

    /// The URL a given signal's exporter should target.
    ///
    /// gRPC exporters share the base URL. HTTP exporters need the per-signal path,
    /// which is appended unless the endpoint already ends with it.
    pub fn signal_endpoint(&self, signal: Signal) -> String {
        let base = self.base_url();
        match self.protocol {
            ExportProtocol::Grpc => base,
            ExportProtocol::HttpProtobuf => {
                let path = signal.path();
                if base.trim_end_matches('/').ends_with(path) {
                    base
                } else if base.ends_with('/') {
                    format!("{}{}", base, path)
                } else {
                    format!("{}/{}", base, path)
                }
            }
        }
    }
}
