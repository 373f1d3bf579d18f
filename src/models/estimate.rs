//! Turbine inputs and estimation results

use serde::{Deserialize, Serialize};

use super::{Coordinate, WeatherObservation};
use crate::Result;

/// Turbine geometry supplied by the caller
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct TurbineSpec {
    /// Blade radius in meters
    pub blade_radius: f64,
    /// Hub height in meters
    pub turbine_height: f64,
}

/// Request body for a single estimate (and each `/compare` entry)
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct WindRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub blade_radius: f64,
    pub turbine_height: f64,
}

impl WindRequest {
    /// Validated coordinate of this request
    pub fn coordinate(&self) -> Result<Coordinate> {
        Coordinate::new(self.latitude, self.longitude)
    }

    #[must_use]
    pub fn turbine(&self) -> TurbineSpec {
        TurbineSpec {
            blade_radius: self.blade_radius,
            turbine_height: self.turbine_height,
        }
    }
}

/// Estimated output of one turbine at one location, rounded for display
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EstimationResult {
    #[serde(rename = "location_input")]
    pub location: Coordinate,
    pub weather: WeatherObservation,
    pub air_density_kg_m3: f64,
    pub adjusted_wind_speed_mps: f64,
    #[serde(rename = "estimated_power_W")]
    pub estimated_power_w: f64,
}

/// Round `value` to `decimals` places, half away from zero
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}
