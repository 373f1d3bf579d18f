//! Data models for the wind estimator
//!
//! This module contains the core domain models organized by concern:
//! - Location: validated coordinates and resolver output
//! - Weather: the instantaneous observation fed to the power model
//! - Estimate: turbine inputs and the shaped estimation result

pub mod estimate;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use estimate::{EstimationResult, TurbineSpec, WindRequest};
pub use location::{Coordinate, ResolvedLocation};
pub use weather::{STANDARD_PRESSURE_HPA, WeatherObservation};
