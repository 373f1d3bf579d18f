use std::path::PathBuf;

use anyhow::{Context, Result};
use wind_estimator::{AppState, WindEstimatorConfig, logging, web};

#[tokio::main]
async fn main() -> Result<()> {
    // Optional explicit config path as the only argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = WindEstimatorConfig::load_from_path(config_path)
        .context("Failed to load configuration")?;

    logging::init(&config.logging)?;
    tracing::info!(
        "Starting wind-estimator {} (weather: {}, geocoding: {})",
        wind_estimator::VERSION,
        config.weather.base_url,
        config.geocoding.base_url
    );

    let state = AppState::from_config(&config)?;
    web::run(&config.server, state).await
}
