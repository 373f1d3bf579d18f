//! HTTP API
//!
//! `POST /estimate`, `POST /compare`, `POST /resolve-gmaps-url`,
//! `GET /search-location` and `GET /health`.

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::WindEstimatorConfig;
use crate::estimator::WindEstimator;
use crate::location_resolver::LocationResolver;
use crate::models::{EstimationResult, ResolvedLocation, WindRequest};
use crate::weather::OpenMeteoClient;
use crate::{Result, VERSION, WindEstimatorError};

/// Shared, immutable handler state
#[derive(Clone)]
pub struct AppState {
    pub estimator: WindEstimator,
    pub resolver: Arc<LocationResolver>,
}

impl AppState {
    pub fn new(estimator: WindEstimator, resolver: LocationResolver) -> Self {
        Self {
            estimator,
            resolver: Arc::new(resolver),
        }
    }

    /// Wire the production clients from configuration
    pub fn from_config(config: &WindEstimatorConfig) -> Result<Self> {
        let weather = OpenMeteoClient::new(&config.weather)?;
        let resolver = LocationResolver::new(&config.resolver, &config.geocoding)?;
        Ok(Self::new(WindEstimator::new(Arc::new(weather)), resolver))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompareRequest {
    pub locations: Vec<WindRequest>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/estimate", post(estimate_power))
        .route("/compare", post(compare_power))
        .route("/resolve-gmaps-url", post(resolve_gmaps_url))
        .route("/search-location", get(search_location))
        .route("/health", get(health))
        .with_state(state)
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| WindEstimatorError::bad_input(rejection.body_text()))
}

async fn estimate_power(
    State(state): State<AppState>,
    payload: std::result::Result<Json<WindRequest>, JsonRejection>,
) -> Result<Json<EstimationResult>> {
    let request = json_body(payload)?;
    info!(
        "Estimate requested at ({}, {})",
        request.latitude, request.longitude
    );
    Ok(Json(state.estimator.estimate(&request).await?))
}

async fn compare_power(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<Vec<EstimationResult>>> {
    let request = json_body(payload)?;
    info!("Comparison requested for {} locations", request.locations.len());
    Ok(Json(state.estimator.compare(&request.locations).await?))
}

async fn resolve_gmaps_url(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<ResolvedLocation>> {
    let request = json_body(payload)?;
    Ok(Json(state.resolver.resolve_url(&request.url).await?))
}

async fn search_location(
    State(state): State<AppState>,
    query: std::result::Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Value>>> {
    let Query(query) =
        query.map_err(|rejection| WindEstimatorError::bad_input(rejection.body_text()))?;
    Ok(Json(state.resolver.search(&query.name).await?))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
    })
}
