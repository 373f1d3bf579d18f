//! Power Estimation Engine
//!
//! Pure functions turning a weather observation and a turbine geometry into
//! an electrical power estimate: air density from the ideal gas law, wind
//! speed extrapolated to hub height with the wind power law, then swept-area
//! aerodynamic power reduced by rotor, gearbox and generator efficiencies.

use std::f64::consts::PI;

use crate::models::estimate::round_to;
use crate::models::{Coordinate, EstimationResult, TurbineSpec, WeatherObservation};

/// Specific gas constant of dry air, J/(kg·K)
pub const R_SPECIFIC_DRY_AIR: f64 = 287.05;
/// Offset between Celsius and Kelvin
pub const KELVIN_OFFSET: f64 = 273.15;
/// Height at which the weather provider reports wind, in meters
pub const REFERENCE_HEIGHT_M: f64 = 10.0;
/// Hellmann exponent for open terrain
pub const SHEAR_EXPONENT: f64 = 0.14;
/// Rotor power coefficient (Betz limit is ~0.593)
pub const POWER_COEFFICIENT: f64 = 0.45;
pub const GEARBOX_EFFICIENCY: f64 = 0.97;
pub const GENERATOR_EFFICIENCY: f64 = 0.96;

/// Full-precision intermediate values of one estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerEstimate {
    /// kg/m³
    pub air_density: f64,
    /// m/s at hub height
    pub adjusted_wind_speed: f64,
    /// W carried by the wind through the swept area
    pub aerodynamic_power: f64,
    /// W delivered after all losses
    pub electrical_power: f64,
}

/// Air density via the ideal gas law.
///
/// Temperatures at or below absolute zero are not rejected and produce
/// non-physical (infinite or negative) densities.
#[must_use]
pub fn air_density(temperature_c: f64, pressure_hpa: f64) -> f64 {
    let temperature_k = temperature_c + KELVIN_OFFSET;
    let pressure_pa = pressure_hpa * 100.0;
    pressure_pa / (R_SPECIFIC_DRY_AIR * temperature_k)
}

/// Extrapolate a 10 m wind speed to `hub_height_m` with the wind power law
#[must_use]
pub fn adjust_wind_speed_for_height(reference_speed: f64, hub_height_m: f64) -> f64 {
    reference_speed * (hub_height_m / REFERENCE_HEIGHT_M).powf(SHEAR_EXPONENT)
}

/// Rotor swept area for a blade radius, m²
#[must_use]
pub fn swept_area(blade_radius: f64) -> f64 {
    PI * blade_radius.powi(2)
}

/// Kinetic power of the wind crossing the rotor disc, in watts
#[must_use]
pub fn aerodynamic_power(air_density: f64, wind_speed: f64, blade_radius: f64) -> f64 {
    0.5 * air_density * swept_area(blade_radius) * wind_speed.powi(3)
}

/// Electrical output after rotor, gearbox and generator losses, in watts
#[must_use]
pub fn electrical_power(air_density: f64, wind_speed: f64, blade_radius: f64) -> f64 {
    aerodynamic_power(air_density, wind_speed, blade_radius)
        * POWER_COEFFICIENT
        * GEARBOX_EFFICIENCY
        * GENERATOR_EFFICIENCY
}

/// Run the whole pipeline at full precision
#[must_use]
pub fn evaluate(weather: &WeatherObservation, turbine: &TurbineSpec) -> PowerEstimate {
    let density = air_density(weather.temperature_c, weather.pressure_hpa);
    let hub_speed = adjust_wind_speed_for_height(weather.wind_speed_mps, turbine.turbine_height);

    PowerEstimate {
        air_density: density,
        adjusted_wind_speed: hub_speed,
        aerodynamic_power: aerodynamic_power(density, hub_speed, turbine.blade_radius),
        electrical_power: electrical_power(density, hub_speed, turbine.blade_radius),
    }
}

/// Estimate turbine output at `location` and shape the rounded result
#[must_use]
pub fn estimate(
    location: Coordinate,
    weather: WeatherObservation,
    turbine: &TurbineSpec,
) -> EstimationResult {
    let estimate = evaluate(&weather, turbine);

    EstimationResult {
        location,
        weather,
        air_density_kg_m3: round_to(estimate.air_density, 3),
        adjusted_wind_speed_mps: round_to(estimate.adjusted_wind_speed, 2),
        estimated_power_w: round_to(estimate.electrical_power, 2),
    }
}
