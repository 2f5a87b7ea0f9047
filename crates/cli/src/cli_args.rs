use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use tally_telemetry::ExportProtocol;

/// Command-line interface for the tally counter harness
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run the counter without telemetry export, logging to the console only
    Plain(CommandArgs),

    /// Run the counter with metrics, traces and logs exported over OTLP
    Instrumented(CommandArgs),
}

impl Commands {
    pub const fn args(&self) -> &CommandArgs {
        match self {
            Self::Plain(args) | Self::Instrumented(args) => args,
        }
    }
}

/// Common command-line arguments for both run modes
#[derive(Args, Clone, Debug)]
pub struct CommandArgs {
    /// Log level (ERROR, WARN, INFO, DEBUG, TRACE)
    #[arg(short, long, default_value = "info", env = "TALLY_LOG_LEVEL")]
    pub log_level: String,

    /// Path to a TOML config file
    #[arg(long, env = "TALLY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub harness: HarnessArgs,

    #[command(flatten)]
    pub telemetry: TelemetryArgs,
}

/// Workload arguments
#[derive(Args, Clone, Debug, Default)]
#[group(required = false, multiple = true)]
pub struct HarnessArgs {
    /// Unit of work to run, in order. Repeat for several units.
    #[arg(short = 'u', long = "unit")]
    pub units: Vec<String>,

    /// Cumulative value at which a unit completes
    #[arg(short, long)]
    pub threshold: Option<u64>,

    /// Milliseconds to sleep between ticks
    #[arg(long = "tick-ms")]
    pub tick_ms: Option<u64>,

    /// Seed for reproducible walks
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Unit that gets failure-path telemetry. Repeat for several units.
    #[arg(long = "fault-unit")]
    pub fault_units: Vec<String>,

    /// Status code attached to fault units
    #[arg(long)]
    pub fault_status_code: Option<u16>,
}

/// OTLP export arguments, only used by `instrumented`
#[derive(Args, Clone, Debug, Default)]
#[group(required = false, multiple = true)]
pub struct TelemetryArgs {
    /// Collector endpoint, e.g. localhost:4317
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Export protocol (grpc, http-protobuf)
    #[arg(long)]
    pub protocol: Option<ExportProtocol>,

    /// Use plaintext transport instead of TLS. A bare `--insecure` means true.
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub insecure: Option<bool>,

    /// Export timeout in seconds
    #[arg(long = "timeout-secs")]
    pub timeout_secs: Option<u64>,

    /// Value of the service.name resource attribute
    #[arg(long)]
    pub service_name: Option<String>,

    /// Value of the deployment.environment resource attribute
    #[arg(long)]
    pub environment: Option<String>,

    /// Value of the service.version resource attribute
    #[arg(long)]
    pub service_version: Option<String>,
}
