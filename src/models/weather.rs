//! Weather observation model

use serde::{Deserialize, Serialize};

/// Standard-atmosphere sea-level pressure in hPa.
///
/// Observations always carry this value; measured pressure is not used.
pub const STANDARD_PRESSURE_HPA: f64 = 1013.25;

/// Instantaneous conditions at a coordinate
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct WeatherObservation {
    /// Temperature in Celsius
    #[serde(rename = "temperature_C")]
    pub temperature_c: f64,
    /// Wind speed in m/s at the provider's 10 m reference height
    pub wind_speed_mps: f64,
    /// Atmospheric pressure in hPa
    #[serde(rename = "pressure_hPa")]
    pub pressure_hpa: f64,
}

impl WeatherObservation {
    /// Build an observation at standard-atmosphere pressure
    #[must_use]
    pub fn at_standard_pressure(temperature_c: f64, wind_speed_mps: f64) -> Self {
        Self {
            temperature_c,
            wind_speed_mps,
            pressure_hpa: STANDARD_PRESSURE_HPA,
        }
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature_c)
    }

    /// Format wind speed with unit
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.1} m/s", self.wind_speed_mps)
    }
}
