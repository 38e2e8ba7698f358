//! HTTP surface of the gateway.

pub mod error;
mod files;
mod health;
mod optimize;

use axum::{Extension, Router};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use optimization::FleetRouting;
use serde::Deserialize;
use std::sync::Arc;
use storage::Bucket;
use storage::naming::Collection;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Largest accepted request body. Also caps the decompressed size of
    /// gzip uploads.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Collaborators shared by every request. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub bucket: Bucket,
    pub fleet_routing: Arc<dyn FleetRouting>,
}

#[derive(thiserror::Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/api/healthz", get(health::healthz))
        .route("/api/optimization/healthz", get(health::healthz))
        .route(
            "/api/optimization/fleet-routing/optimize-tours",
            post(optimize::optimize_tours),
        )
        .merge(files::routes(Collection::Scenarios))
        .merge(files::routes(Collection::Solutions))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(Extension(optimize::DecompressedLimit(config.max_body_bytes)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(
    host: &str,
    port: u16,
    state: AppState,
    config: &Config,
) -> Result<(), ServeError> {
    let app = router(state, config);

    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    tracing::info!(host, port, "Listening for requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received, draining connections");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.max_body_bytes, 50 * 1024 * 1024);

        let config: Config = serde_yaml::from_str("max_body_bytes: 1024").unwrap();
        assert_eq!(config.max_body_bytes, 1024);
    }
}
