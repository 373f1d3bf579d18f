//! Weather API client for Open-Meteo
//!
//! Fetches the instantaneous temperature and wind speed for a coordinate.
//! Pressure is not taken from the provider; every observation carries the
//! standard-atmosphere constant.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info, instrument, warn};

use crate::config::WeatherConfig;
use crate::error::Upstream;
use crate::models::{Coordinate, WeatherObservation};
use crate::{Result, WindEstimatorError};

/// Anything that can report current conditions at a coordinate
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_weather(&self, coordinate: Coordinate) -> Result<WeatherObservation>;
}

/// Open-Meteo current weather client
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    /// Create a new weather API client
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("WindEstimator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                WindEstimatorError::config(format!("Failed to create weather HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn forecast_url(&self, coordinate: Coordinate) -> String {
        format!(
            "{}/forecast?latitude={}&longitude={}&current_weather=true&wind_speed_unit=ms",
            self.base_url, coordinate.latitude, coordinate.longitude
        )
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    async fn fetch_weather(&self, coordinate: Coordinate) -> Result<WeatherObservation> {
        let start_time = Instant::now();
        let url = self.forecast_url(coordinate);
        debug!("OpenMeteo API request URL: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                error!("Weather request failed: {}", e);
                WindEstimatorError::from_upstream(Upstream::Weather, &e)
            })?;

        let body: openmeteo::CurrentWeatherResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                return WindEstimatorError::from_upstream(Upstream::Weather, &e);
            }
            error!("Failed to parse weather response: {}", e);
            WindEstimatorError::unavailable(
                Upstream::Weather,
                "invalid weather data received from OpenMeteo",
            )
        })?;

        let current = body.current_weather.ok_or_else(|| {
            WindEstimatorError::unavailable(
                Upstream::Weather,
                format!(
                    "no current weather available for {}",
                    coordinate.format_coordinates()
                ),
            )
        })?;

        let observation =
            WeatherObservation::at_standard_pressure(current.temperature, current.windspeed);

        let total_duration = start_time.elapsed();
        info!(
            "Current weather at {}: {}, wind {} ({:.3}s)",
            coordinate.format_coordinates(),
            observation.format_temperature(),
            observation.format_wind(),
            total_duration.as_secs_f64()
        );
        if total_duration > Duration::from_secs(5) {
            warn!(
                "Slow API response detected: {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        Ok(observation)
    }
}

/// `OpenMeteo` API response structures
mod openmeteo {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct CurrentWeatherResponse {
        pub current_weather: Option<CurrentWeather>,
    }

    /// `current_weather=true` block; wind is in m/s with `wind_speed_unit=ms`
    #[derive(Debug, Deserialize)]
    pub struct CurrentWeather {
        pub temperature: f64,
        pub windspeed: f64,
    }
}
