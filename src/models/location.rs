//! Location models: validated coordinates and resolver output

use serde::{Deserialize, Serialize};

use crate::{Result, WindEstimatorError};

/// Geographic coordinate in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees, -90..=90
    pub latitude: f64,
    /// Longitude in decimal degrees, -180..=180
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting values outside the valid ranges
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(WindEstimatorError::bad_input(format!(
                "Latitude must be between -90 and 90, got: {latitude}"
            )));
        }

        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(WindEstimatorError::bad_input(format!(
                "Longitude must be between -180 and 180, got: {longitude}"
            )));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Outcome of resolving a map link to a coordinate
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Display name reported by the geocoder, if one was consulted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found_name: Option<String>,
    /// `true` when the coordinate is the centroid of a broader area
    /// (city, region) rather than the exact point the link referred to.
    #[serde(rename = "isAreaResult")]
    pub is_area_result: bool,
}

impl ResolvedLocation {
    /// Exact point read straight out of the link
    #[must_use]
    pub fn exact(coordinate: Coordinate) -> Self {
        Self {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            found_name: None,
            is_area_result: false,
        }
    }

    /// Point obtained from the geocoder
    #[must_use]
    pub fn geocoded(coordinate: Coordinate, found_name: Option<String>, is_area_result: bool) -> Self {
        Self {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            found_name,
            is_area_result,
        }
    }
}
