use crate::config::{LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const METRICS_PREFIX: &str = "relay";

#[derive(thiserror::Error, Debug)]
pub enum ObservabilityError {
    #[error("statsd exporter error: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("a metrics recorder is already installed: {0}")]
    RecorderInstalled(String),
}

/// Installs the tracing subscriber, plus the Sentry layer when a DSN is configured.
/// The returned guard flushes Sentry events when dropped.
pub fn init_logging(logging: Option<&LoggingConfig>) -> Option<sentry::ClientInitGuard> {
    let guard = logging.map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let sentry_layer = guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();

    guard
}

pub fn init_metrics(metrics_config: &MetricsConfig) -> Result<(), ObservabilityError> {
    let recorder = StatsdBuilder::from(metrics_config.statsd_host.as_str(), metrics_config.statsd_port)
        .build(Some(METRICS_PREFIX))?;

    metrics::set_global_recorder(recorder)
        .map_err(|e| ObservabilityError::RecorderInstalled(e.to_string()))?;

    tracing::info!(
        host = %metrics_config.statsd_host,
        port = metrics_config.statsd_port,
        "Sending metrics to statsd"
    );
    Ok(())
}
