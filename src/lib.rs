//! `WindEstimator` - wind turbine power estimation service
//!
//! This library combines live weather with a physical power model to estimate
//! the electrical output of a wind turbine at a location, and resolves
//! map-sharing links and place names into coordinates.

pub mod api;
pub mod config;
pub mod error;
pub mod estimation;
pub mod estimator;
pub mod geocoding;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use config::WindEstimatorConfig;
pub use error::{Upstream, WindEstimatorError};
pub use estimator::WindEstimator;
pub use geocoding::{GeocodedPlace, GeocodingClient};
pub use location_resolver::LocationResolver;
pub use models::{
    Coordinate, EstimationResult, ResolvedLocation, TurbineSpec, WeatherObservation, WindRequest,
};
pub use weather::{OpenMeteoClient, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WindEstimatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
