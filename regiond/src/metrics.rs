use crate::config::MetricsConfig;
use metrics_exporter_statsd::StatsdBuilder;

const METRICS_PREFIX: &str = "regiond";

#[derive(thiserror::Error, Debug)]
pub enum MetricsInitError {
    #[error("failed to build statsd recorder: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("a global metrics recorder is already installed")]
    RecorderAlreadySet,
}

/// Installs the statsd recorder and registers descriptions for every metric
/// the router and directory emit. Without a metrics section all metrics are
/// dropped by the default no-op recorder.
pub fn init(config: Option<&MetricsConfig>) -> Result<(), MetricsInitError> {
    let Some(config) = config else {
        tracing::info!("No metrics backend configured");
        return Ok(());
    };

    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(METRICS_PREFIX))?;
    metrics::set_global_recorder(recorder).map_err(|_| MetricsInitError::RecorderAlreadySet)?;

    shared::metrics_defs::describe_all(region_directory::ALL_METRICS);
    shared::metrics_defs::describe_all(region_router::ALL_METRICS);

    tracing::info!(
        statsd_host = %config.statsd_host,
        statsd_port = config.statsd_port,
        "Metrics initialized"
    );
    Ok(())
}
