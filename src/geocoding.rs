//! Nominatim geocoding client
//!
//! Turns free-text place names into coordinate candidates. Nominatim's usage
//! policy requires an identifying User-Agent, taken from configuration.

use std::time::Instant;

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::config::GeocodingConfig;
use crate::error::Upstream;
use crate::models::Coordinate;
use crate::{Result, WindEstimatorError};

/// One Nominatim search hit
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GeocodedPlace {
    /// Latitude, sent by Nominatim as a string
    pub lat: String,
    /// Longitude, sent by Nominatim as a string
    pub lon: String,
    pub display_name: Option<String>,
    /// OSM feature class, e.g. "place" or "boundary"
    pub class: Option<String>,
    /// OSM feature type, e.g. "city"
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl GeocodedPlace {
    /// Parse and validate the coordinate of this hit
    pub fn coordinate(&self) -> Result<Coordinate> {
        let parse = |value: &str, axis: &str| {
            value.trim().parse::<f64>().map_err(|_| {
                WindEstimatorError::unavailable(
                    Upstream::Geocoding,
                    format!("invalid {axis} '{value}' in geocoding response"),
                )
            })
        };
        let latitude = parse(&self.lat, "latitude")?;
        let longitude = parse(&self.lon, "longitude")?;

        Coordinate::new(latitude, longitude).map_err(|_| {
            WindEstimatorError::unavailable(
                Upstream::Geocoding,
                format!("geocoding response has out-of-range coordinate {latitude}, {longitude}"),
            )
        })
    }
}

/// Nominatim search client
pub struct GeocodingClient {
    client: Client,
    base_url: String,
}

impl GeocodingClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                WindEstimatorError::config(format!("Failed to create geocoding HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, query: &str, limit: u32) -> String {
        format!(
            "{}/search?q={}&format=json&limit={}",
            self.base_url,
            urlencoding::encode(query),
            limit
        )
    }

    /// Typed search, best match first
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<GeocodedPlace>> {
        self.request(query, limit).await
    }

    /// Search returning the provider's objects untouched
    #[instrument(skip(self))]
    pub async fn search_raw(&self, query: &str, limit: u32) -> Result<Vec<Value>> {
        let mut results: Vec<Value> = self.request(query, limit).await?;
        results.truncate(limit as usize);
        Ok(results)
    }

    async fn request<T: DeserializeOwned>(&self, query: &str, limit: u32) -> Result<Vec<T>> {
        info!("Geocoding location: '{}'", query);
        let start_time = Instant::now();
        let url = self.search_url(query, limit);
        debug!("Nominatim request URL: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                error!("Geocoding request for '{}' failed: {}", query, e);
                WindEstimatorError::from_upstream(Upstream::Geocoding, &e)
            })?;

        let results: Vec<T> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                return WindEstimatorError::from_upstream(Upstream::Geocoding, &e);
            }
            error!("Failed to parse geocoding response for '{}': {}", query, e);
            WindEstimatorError::unavailable(
                Upstream::Geocoding,
                "invalid geocoding data received from Nominatim",
            )
        })?;

        if results.is_empty() {
            warn!("No results found for location '{}'", query);
        } else {
            info!(
                "Found {} geocoding results for '{}' in {:.3}s",
                results.len(),
                query,
                start_time.elapsed().as_secs_f64()
            );
        }

        Ok(results)
    }
}
