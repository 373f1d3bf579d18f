//! Error types and handling for the wind estimator service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// External services the estimator talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    /// Open-Meteo current weather
    Weather,
    /// Nominatim search
    Geocoding,
    /// The map-sharing link being followed through its redirects
    MapLink,
}

impl Upstream {
    /// Human-readable service name used in error details
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Upstream::Weather => "weather service",
            Upstream::Geocoding => "geocoding service",
            Upstream::MapLink => "map link redirect",
        }
    }
}

/// Main error type for the wind estimator
#[derive(Error, Debug)]
pub enum WindEstimatorError {
    /// Malformed or out-of-range input
    #[error("Invalid input: {message}")]
    BadInput { message: String },

    /// A lookup finished but matched nothing
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// An upstream call failed. `transient` is set when it timed out.
    #[error("{} unavailable: {message}", .service.describe())]
    ServiceUnavailable {
        service: Upstream,
        message: String,
        transient: bool,
    },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl WindEstimatorError {
    /// Create a new bad input error
    pub fn bad_input<S: Into<String>>(message: S) -> Self {
        Self::BadInput {
            message: message.into(),
        }
    }

    /// Create a new not found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a non-timeout upstream failure
    pub fn unavailable<S: Into<String>>(service: Upstream, message: S) -> Self {
        Self::ServiceUnavailable {
            service,
            message: message.into(),
            transient: false,
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Classify a transport error raised while talking to `service`
    #[must_use]
    pub fn from_upstream(service: Upstream, err: &reqwest::Error) -> Self {
        let transient = err.is_timeout();
        let message = if transient {
            format!("request to the {} timed out", service.describe())
        } else if let Some(status) = err.status() {
            format!("{} answered with status {status}", service.describe())
        } else {
            format!("could not connect to the {}: {err}", service.describe())
        };
        Self::ServiceUnavailable {
            service,
            message,
            transient,
        }
    }

    /// Stable machine-readable kind, used in response bodies
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadInput { .. } => "bad_input",
            Self::NotFound { .. } => "not_found",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::Config { .. } => "config",
        }
    }

    /// HTTP status for this error. Timeouts share 503 with other upstream failures.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadInput { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure was an upstream timeout
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { transient: true, .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::BadInput { message } | Self::NotFound { message } => message.clone(),
            Self::ServiceUnavailable { service, message, .. } => {
                format!("The {} is currently unavailable: {message}", service.describe())
            }
            Self::Config { .. } => {
                "Server configuration error. Please contact the operator.".to_string()
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
    transient: bool,
}

impl IntoResponse for WindEstimatorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = ErrorBody {
            error: self.kind(),
            detail: self.user_message(),
            transient: self.is_transient(),
        };
        (status, Json(body)).into_response()
    }
}
