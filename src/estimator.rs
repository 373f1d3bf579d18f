//! Estimator service
//!
//! Glues weather acquisition to the power model for single estimates and
//! two-site comparisons.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::Result;
use crate::estimation;
use crate::models::{EstimationResult, WindRequest};
use crate::weather::WeatherProvider;

/// Number of sites a comparison looks at; extra entries are ignored
pub const MAX_COMPARED_LOCATIONS: usize = 2;

/// Per-request estimation service over a weather source
#[derive(Clone)]
pub struct WindEstimator {
    weather: Arc<dyn WeatherProvider>,
}

impl WindEstimator {
    pub fn new(weather: Arc<dyn WeatherProvider>) -> Self {
        Self { weather }
    }

    /// Fetch current weather at the requested site and estimate turbine output
    pub async fn estimate(&self, request: &WindRequest) -> Result<EstimationResult> {
        let coordinate = request.coordinate()?;
        let turbine = request.turbine();

        let weather = self.weather.fetch_weather(coordinate).await?;
        let result = estimation::estimate(coordinate, weather, &turbine);

        info!(
            "Estimated {:.2} W at {} (hub wind {:.2} m/s, radius {} m)",
            result.estimated_power_w,
            coordinate.format_coordinates(),
            result.adjusted_wind_speed_mps,
            turbine.blade_radius
        );
        Ok(result)
    }

    /// Estimate the first two sites concurrently; results keep input order.
    /// Any failure fails the whole comparison.
    pub async fn compare(&self, requests: &[WindRequest]) -> Result<Vec<EstimationResult>> {
        if requests.len() > MAX_COMPARED_LOCATIONS {
            debug!(
                "Comparison received {} locations, using the first {}",
                requests.len(),
                MAX_COMPARED_LOCATIONS
            );
        }

        try_join_all(
            requests
                .iter()
                .take(MAX_COMPARED_LOCATIONS)
                .map(|request| self.estimate(request)),
        )
        .await
    }
}
