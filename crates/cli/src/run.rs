use std::sync::Arc;
use tally_harness::{Harness, HarnessConfig, RunReport};
use tally_telemetry::{LogBridge, NoopSink, TelemetryConfig, TelemetrySink, create_telemetry};
use tracing::{info, warn};

use crate::error::CliError;

/// Run the workload with console logging only.
pub async fn run_plain(harness: HarnessConfig) -> Result<RunReport, CliError> {
    info!("Starting plain run");

    run_harness(Arc::new(NoopSink), harness).await
}

/// Run the workload with metrics, traces and logs exported over OTLP.
///
/// Log records are bridged to the collector when `log_bridge` is given.
/// Telemetry is shut down after the run even if the harness failed, so that
/// buffered spans and logs reach the collector.
pub async fn run_instrumented(
    harness: HarnessConfig,
    telemetry: &TelemetryConfig,
    log_bridge: Option<&LogBridge>,
) -> Result<RunReport, CliError> {
    let instance = create_telemetry(telemetry, log_bridge)?;
    info!(
        "Starting instrumented run, exporting to {} over {}",
        telemetry.endpoint, telemetry.protocol
    );

    let result = run_harness(instance.sink(), harness).await;

    tokio::task::spawn_blocking(move || instance.shutdown())
        .await
        .map_err(|e| CliError::Runtime(format!("telemetry shutdown task failed: {}", e)))?;

    result
}

/// Drive the blocking harness on a dedicated thread so the exporters keep
/// making progress on the runtime.
async fn run_harness<S>(sink: Arc<S>, config: HarnessConfig) -> Result<RunReport, CliError>
where
    S: TelemetrySink + 'static,
{
    let report = tokio::task::spawn_blocking(move || {
        let units = config.units.clone();
        Harness::new(sink, &config).run(&units)
    })
    .await
    .map_err(|e| CliError::Runtime(format!("harness task failed: {}", e)))??;

    for unit in &report.units {
        if unit.faulted {
            warn!("{} finished with {} ticks, total {} (faulted)", unit.name, unit.ticks, unit.total);
        } else {
            info!("{} finished with {} ticks, total {}", unit.name, unit.ticks, unit.total);
        }
    }
    info!(
        "Run complete: {} units, {} ticks",
        report.units.len(),
        report.total_ticks()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tally_harness::HarnessError;

    fn fast_config() -> HarnessConfig {
        HarnessConfig {
            tick_interval: Duration::ZERO,
            seed: Some(1),
            ..HarnessConfig::default()
        }
    }

    #[tokio::test]
    async fn test_plain_run_completes_every_unit() {
        let report = run_plain(fast_config()).await.unwrap();

        let names = report.units.iter().map(|u| u.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["first-child", "second-child", "third-child"]);
        assert!(report.units.iter().all(|u| u.total >= 50));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_instrumented_run_with_signals_disabled() {
        let report = run_instrumented(fast_config(), &TelemetryConfig::disabled(), None)
            .await
            .unwrap();

        assert_eq!(report.units.len(), 3);
        assert_eq!(
            report.units.iter().filter(|u| u.faulted).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_invalid_units_surface_as_harness_error() {
        let config = HarnessConfig {
            units: vec!["same".to_string(), "same".to_string()],
            ..fast_config()
        };

        let result = run_plain(config).await;
        assert!(matches!(
            result,
            Err(CliError::Harness(HarnessError::InvalidUnit(_)))
        ));
    }
}
