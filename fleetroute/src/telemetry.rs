//! Logging, error reporting and metrics setup for the binary.

use crate::config::{LogFormat, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::{StatsdBuilder, StatsdError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const METRICS_PREFIX: &str = "fleetroute";

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("invalid log level: {0}")]
    LogLevel(#[from] tracing_subscriber::filter::ParseError),
    #[error("could not install log subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
    #[error("could not build statsd exporter: {0}")]
    Statsd(#[from] StatsdError),
    #[error("a metrics recorder is already installed")]
    RecorderInstalled,
}

/// Keeps the Sentry client alive. Events are flushed when dropped.
pub struct Telemetry {
    _sentry: Option<sentry::ClientInitGuard>,
}

pub fn init(
    logging: &LoggingConfig,
    metrics: Option<&MetricsConfig>,
) -> Result<Telemetry, TelemetryError> {
    let sentry = logging.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    init_tracing(logging, sentry.is_some())?;

    if let Some(metrics) = metrics {
        init_metrics(metrics)?;
        tracing::info!(
            host = %metrics.statsd_host,
            port = metrics.statsd_port,
            "Exporting metrics to statsd"
        );
    }

    Ok(Telemetry { _sentry: sentry })
}

fn env_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    Ok(EnvFilter::try_new(level)?)
}

fn init_tracing(logging: &LoggingConfig, with_sentry: bool) -> Result<(), TelemetryError> {
    let filter = env_filter(&logging.level)?;

    match logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .with(with_sentry.then(sentry::integrations::tracing::layer))
            .try_init()?,
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .with(with_sentry.then(sentry::integrations::tracing::layer))
            .try_init()?,
    }

    Ok(())
}

fn init_metrics(config: &MetricsConfig) -> Result<(), TelemetryError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(METRICS_PREFIX))?;
    metrics::set_global_recorder(recorder).map_err(|_| TelemetryError::RecorderInstalled)?;

    shared::metrics_defs::describe_all(storage::metrics_defs::ALL_METRICS);
    shared::metrics_defs::describe_all(optimization::metrics_defs::ALL_METRICS);

    Ok(())
}
