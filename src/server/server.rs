use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::routes;
use crate::weather::QWeatherClient;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub weather: Arc<QWeatherClient>,
}

impl AppState {
    pub fn new(metrics: &Metrics, weather: Arc<QWeatherClient>) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            weather,
        }
    }
}

pub fn build_router(settings_config: &SettingsConfig, state: AppState) -> Router {
    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(routes::router())
        .with_state(state)
}

/// Bind the configured address and serve until the listener fails.
pub async fn start(settings_config: &SettingsConfig, weather: Arc<QWeatherClient>) -> Result<()> {
    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow!("cannot bind {}: {}", bind_addr, e))?;
    serve(listener, settings_config, weather).await
}

pub async fn serve(
    listener: TcpListener,
    settings_config: &SettingsConfig,
    weather: Arc<QWeatherClient>,
) -> Result<()> {
    let metrics = get_metrics().await;
    let app = build_router(settings_config, AppState::new(metrics, weather));

    info!("listening on {}", listener.local_addr()?);
    metrics.up.set(1);
    axum::serve(listener, app).await?;
    Ok(())
}
