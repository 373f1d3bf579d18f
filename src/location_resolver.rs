//! Location Resolution Module
//!
//! Resolves map-sharing links and free-text place names into coordinates.
//!
//! A link is resolved by a fixed pipeline of stages, each either finishing
//! the resolution or handing over to the next one:
//!
//! 1. follow the link through its redirects to the final URL
//! 2. read an embedded `!3d<lat>!4d<lon>` pin or `@<lat>,<lon>` viewport
//! 3. pull the place name out of a `/place/<name>` segment
//! 4. geocode the place name, falling back to its trailing context
//!    ("123 Main St, Springfield, IL" -> "Springfield, IL") as an area result
//!
//! Every stage runs at most once and every upstream failure ends the request.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::{Client, Url, redirect::Policy};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::{GeocodingConfig, ResolverConfig};
use crate::error::Upstream;
use crate::geocoding::GeocodingClient;
use crate::models::{Coordinate, ResolvedLocation};
use crate::{Result, WindEstimatorError};

/// Place pin, e.g. `!3d37.8199286!4d-122.4782551`
static PIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!3d(-?\d+(?:\.\d+)?)!4d(-?\d+(?:\.\d+)?)").unwrap());

/// Viewport center, e.g. `@37.7749,-122.4194,12z`
static VIEWPORT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(-?\d+\.\d+),(-?\d+\.\d+)").unwrap());

static PLACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/place/([^/?#]+)").unwrap());

/// Resolution pipeline states, in the order they run
#[derive(Debug)]
enum ResolveState {
    ResolveRedirect(Url),
    MatchCoordinatePattern(String),
    ExtractPlaceName(String),
    GeocodeLookup(String),
}

impl ResolveState {
    fn name(&self) -> &'static str {
        match self {
            ResolveState::ResolveRedirect(_) => "resolve_redirect",
            ResolveState::MatchCoordinatePattern(_) => "match_coordinate_pattern",
            ResolveState::ExtractPlaceName(_) => "extract_place_name",
            ResolveState::GeocodeLookup(_) => "geocode_lookup",
        }
    }
}

enum Transition {
    Next(ResolveState),
    Resolved(ResolvedLocation),
}

/// Parse the caller's link; only absolute http(s) URLs are followed
pub fn parse_map_url(input: &str) -> Result<Url> {
    let url = Url::parse(input.trim())
        .map_err(|e| WindEstimatorError::bad_input(format!("Malformed URL '{input}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(WindEstimatorError::bad_input(format!(
            "Unsupported URL scheme '{scheme}', expected http or https"
        ))),
    }
}

/// Read a coordinate embedded in a map URL. The place pin wins over the
/// viewport center; out-of-range values do not count as a match.
#[must_use]
pub fn match_coordinate_pattern(url: &str) -> Option<Coordinate> {
    [&*PIN_PATTERN, &*VIEWPORT_PATTERN]
        .into_iter()
        .find_map(|pattern| {
            let captures = pattern.captures(url)?;
            let latitude = captures[1].parse::<f64>().ok()?;
            let longitude = captures[2].parse::<f64>().ok()?;
            Coordinate::new(latitude, longitude).ok()
        })
}

/// Extract the human-readable place name from a `/place/<name>` segment
#[must_use]
pub fn extract_place_name(url: &str) -> Option<String> {
    let segment = PLACE_PATTERN.captures(url)?.get(1)?.as_str().replace('+', " ");
    let decoded = urlencoding::decode_binary(segment.as_bytes());
    let decoded = String::from_utf8_lossy(&decoded);

    let name = decoded.split('|').next().unwrap_or_default().trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Drop the most specific part of a comma-separated place name.
/// Returns `None` when there is no broader context to fall back to.
#[must_use]
pub fn context_fallback(place_name: &str) -> Option<String> {
    let segments: Vec<&str> = place_name
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    (segments.len() >= 2).then(|| segments[1..].join(", "))
}

/// Service for resolving map links and place names
pub struct LocationResolver {
    http: Client,
    geocoder: GeocodingClient,
    search_limit: u32,
}

impl LocationResolver {
    pub fn new(resolver: &ResolverConfig, geocoding: &GeocodingConfig) -> Result<Self> {
        let http = Client::builder()
            .redirect(Policy::limited(resolver.max_redirects as usize))
            .timeout(resolver.timeout())
            .user_agent(resolver.user_agent.clone())
            .build()
            .map_err(|e| {
                WindEstimatorError::config(format!("Failed to create redirect HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            geocoder: GeocodingClient::new(geocoding)?,
            search_limit: geocoding.search_limit,
        })
    }

    /// Resolve a map-sharing link into exactly one location
    #[instrument(skip(self))]
    pub async fn resolve_url(&self, input: &str) -> Result<ResolvedLocation> {
        let mut state = ResolveState::ResolveRedirect(parse_map_url(input)?);

        loop {
            debug!("Resolver stage: {}", state.name());
            state = match self.advance(state).await? {
                Transition::Next(next) => next,
                Transition::Resolved(location) => {
                    info!(
                        "Resolved map link to ({:.4}, {:.4}), area result: {}",
                        location.latitude, location.longitude, location.is_area_result
                    );
                    return Ok(location);
                }
            };
        }
    }

    async fn advance(&self, state: ResolveState) -> Result<Transition> {
        match state {
            ResolveState::ResolveRedirect(url) => {
                let final_url = self.follow_redirects(url).await?;
                Ok(Transition::Next(ResolveState::MatchCoordinatePattern(final_url)))
            }
            ResolveState::MatchCoordinatePattern(final_url) => {
                Ok(match match_coordinate_pattern(&final_url) {
                    Some(coordinate) => Transition::Resolved(ResolvedLocation::exact(coordinate)),
                    None => Transition::Next(ResolveState::ExtractPlaceName(final_url)),
                })
            }
            ResolveState::ExtractPlaceName(final_url) => {
                let name = extract_place_name(&final_url).ok_or_else(|| {
                    WindEstimatorError::bad_input(
                        "Could not find a place name in the URL after redirection.",
                    )
                })?;
                Ok(Transition::Next(ResolveState::GeocodeLookup(name)))
            }
            ResolveState::GeocodeLookup(name) => {
                self.geocode_place(&name).await.map(Transition::Resolved)
            }
        }
    }

    /// Follow redirects and return the landing URL
    async fn follow_redirects(&self, url: Url) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| WindEstimatorError::from_upstream(Upstream::MapLink, &e))?;

        let final_url = response.url().to_string();
        debug!("Map link landed on {}", final_url);
        Ok(final_url)
    }

    /// Precise lookup of the full name, then the broader context as an area
    async fn geocode_place(&self, name: &str) -> Result<ResolvedLocation> {
        let mut tiers = vec![(name.to_string(), false)];
        tiers.extend(context_fallback(name).map(|context| (context, true)));

        for (query, is_area_result) in tiers {
            let Some(place) = self.geocoder.search(&query, 1).await?.into_iter().next() else {
                warn!("No geocoding match for '{}'", query);
                continue;
            };

            debug!(
                "Geocoded '{}' to {:?} ({}/{})",
                query,
                place.display_name,
                place.class.as_deref().unwrap_or("?"),
                place.kind.as_deref().unwrap_or("?")
            );
            let coordinate = place.coordinate()?;
            return Ok(ResolvedLocation::geocoded(
                coordinate,
                place.display_name,
                is_area_result,
            ));
        }

        Err(WindEstimatorError::not_found(format!(
            "Nominatim could not find a location for '{name}'."
        )))
    }

    /// Free-text search returning up to the configured number of raw candidates
    #[instrument(skip(self))]
    pub async fn search(&self, name: &str) -> Result<Vec<Value>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WindEstimatorError::bad_input("Location name cannot be empty"));
        }

        let results = self.geocoder.search_raw(name, self.search_limit).await?;
        if results.is_empty() {
            return Err(WindEstimatorError::not_found(format!(
                "No locations found for '{name}'."
            )));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Query, State},
        response::Redirect,
        routing::get,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    #[derive(Clone, Default)]
    struct Hits {
        geocoder: Arc<AtomicUsize>,
    }

    async fn fake_search(
        State(hits): State<Hits>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        hits.geocoder.fetch_add(1, Ordering::SeqCst);
        let body = match params.get("q").map(String::as_str) {
            Some("Golden Gate Bridge") => json!([{
                "lat": "37.8199286", "lon": "-122.4782551",
                "display_name": "Golden Gate Bridge, San Francisco",
                "class": "man_made", "type": "bridge"
            }]),
            Some("Springfield, IL") => json!([{
                "lat": "39.7990175", "lon": "-89.6439575",
                "display_name": "Springfield, Sangamon County, Illinois",
                "class": "boundary", "type": "administrative"
            }]),
            Some("Paris") => json!([
                {"lat": "48.8566", "lon": "2.3522", "display_name": "Paris, France"},
                {"lat": "33.6609", "lon": "-95.5555", "display_name": "Paris, Texas"}
            ]),
            _ => json!([]),
        };
        Json(body)
    }

    async fn fake_upstream() -> (String, Hits) {
        let hits = Hits::default();
        let app = Router::new()
            .route(
                "/short/viewport",
                get(|| async { Redirect::to("/maps/@37.7749,-122.4194,12z") }),
            )
            .route(
                "/short/pin",
                get(|| async {
                    Redirect::to(
                        "/maps/place/Golden+Gate+Bridge/@37.80,-122.47,14z/data=!3d37.8199286!4d-122.4782551",
                    )
                }),
            )
            .route(
                "/short/place",
                get(|| async { Redirect::to("/maps/place/Golden+Gate+Bridge%7CSan+Francisco/data=x") }),
            )
            .route(
                "/short/address",
                get(|| async { Redirect::to("/maps/place/123+Main+St,+Springfield,+IL/") }),
            )
            .route(
                "/short/unknown",
                get(|| async { Redirect::to("/maps/place/Nowhere+Special,+Atlantis/") }),
            )
            .route(
                "/short/search",
                get(|| async { Redirect::to("/maps/search/coffee") }),
            )
            .route("/maps/{*rest}", get(|| async { "map page" }))
            .route("/search", get(fake_search))
            .with_state(hits.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), hits)
    }

    fn resolver_for(base_url: &str) -> LocationResolver {
        let geocoding = GeocodingConfig {
            base_url: base_url.to_string(),
            ..GeocodingConfig::default()
        };
        LocationResolver::new(&ResolverConfig::default(), &geocoding).unwrap()
    }

    #[test]
    fn test_match_viewport_coordinate() {
        let coordinate =
            match_coordinate_pattern("https://www.google.com/maps/@37.7749,-122.4194,12z").unwrap();
        assert_eq!(coordinate.latitude, 37.7749);
        assert_eq!(coordinate.longitude, -122.4194);
    }

    #[test]
    fn test_pin_wins_over_viewport() {
        let url = "https://www.google.com/maps/place/X/@1.5,2.5,10z/data=!4m5!3m4!3d-33.8567844!4d151.213108";
        let coordinate = match_coordinate_pattern(url).unwrap();
        assert_eq!(coordinate.latitude, -33.8567844);
        assert_eq!(coordinate.longitude, 151.213108);
    }

    #[test]
    fn test_no_coordinate_pattern() {
        assert!(match_coordinate_pattern("https://www.google.com/maps/place/Eiffel+Tower/").is_none());
        // integers are not a viewport marker
        assert!(match_coordinate_pattern("https://example.com/@37,122").is_none());
        // out of range
        assert!(match_coordinate_pattern("https://example.com/@137.5,10.1,3z").is_none());
    }

    #[test]
    fn test_extract_place_name() {
        assert_eq!(
            extract_place_name("https://www.google.com/maps/place/Eiffel+Tower/data=abc").as_deref(),
            Some("Eiffel Tower")
        );
        assert_eq!(
            extract_place_name("https://maps.example/place/Caf%C3%A9+de+Flore%7CParis/").as_deref(),
            Some("Café de Flore")
        );
        assert_eq!(
            extract_place_name("https://maps.example/place/+%20Brandenburger+Tor+/").as_deref(),
            Some("Brandenburger Tor")
        );
        assert_eq!(
            extract_place_name("https://maps.example/place/Golden+Gate?entry=ttu").as_deref(),
            Some("Golden Gate")
        );
        assert!(extract_place_name("https://maps.example/search/coffee").is_none());
        assert!(extract_place_name("https://maps.example/place/%7Conly-context").is_none());
    }

    #[test]
    fn test_context_fallback() {
        assert_eq!(
            context_fallback("123 Main St, Springfield, IL").as_deref(),
            Some("Springfield, IL")
        );
        assert_eq!(context_fallback("Berlin, Germany").as_deref(), Some("Germany"));
        assert!(context_fallback("Berlin").is_none());
        assert!(context_fallback("Berlin, ").is_none());
    }

    #[test]
    fn test_parse_map_url() {
        assert!(parse_map_url("https://maps.app.goo.gl/abc123").is_ok());
        assert!(matches!(
            parse_map_url("not a url"),
            Err(WindEstimatorError::BadInput { .. })
        ));
        assert!(matches!(
            parse_map_url("ftp://maps.example/place/X"),
            Err(WindEstimatorError::BadInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_viewport_link_skips_geocoder() {
        let (base, hits) = fake_upstream().await;
        let resolver = resolver_for(&base);

        let location = resolver
            .resolve_url(&format!("{base}/short/viewport"))
            .await
            .unwrap();

        assert_eq!(location.latitude, 37.7749);
        assert_eq!(location.longitude, -122.4194);
        assert!(!location.is_area_result);
        assert!(location.found_name.is_none());
        assert_eq!(hits.geocoder.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pin_link_skips_geocoder() {
        let (base, hits) = fake_upstream().await;
        let resolver = resolver_for(&base);

        let location = resolver.resolve_url(&format!("{base}/short/pin")).await.unwrap();

        assert_eq!(location.latitude, 37.8199286);
        assert_eq!(hits.geocoder.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_place_link_is_geocoded_precisely() {
        let (base, hits) = fake_upstream().await;
        let resolver = resolver_for(&base);

        let location = resolver.resolve_url(&format!("{base}/short/place")).await.unwrap();

        assert_eq!(location.latitude, 37.8199286);
        assert_eq!(location.longitude, -122.4782551);
        assert_eq!(
            location.found_name.as_deref(),
            Some("Golden Gate Bridge, San Francisco")
        );
        assert!(!location.is_area_result);
        assert_eq!(hits.geocoder.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_address_falls_back_to_area() {
        let (base, hits) = fake_upstream().await;
        let resolver = resolver_for(&base);

        let location = resolver
            .resolve_url(&format!("{base}/short/address"))
            .await
            .unwrap();

        assert!(location.is_area_result);
        assert_eq!(location.latitude, 39.7990175);
        assert_eq!(hits.geocoder.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unresolvable_place_is_not_found() {
        let (base, _hits) = fake_upstream().await;
        let resolver = resolver_for(&base);

        let err = resolver
            .resolve_url(&format!("{base}/short/unknown"))
            .await
            .unwrap_err();

        assert!(matches!(err, WindEstimatorError::NotFound { .. }));
        assert!(err.to_string().contains("Nowhere Special, Atlantis"));
    }

    #[tokio::test]
    async fn test_link_without_place_is_bad_input() {
        let (base, hits) = fake_upstream().await;
        let resolver = resolver_for(&base);

        let err = resolver
            .resolve_url(&format!("{base}/short/search"))
            .await
            .unwrap_err();

        assert!(matches!(err, WindEstimatorError::BadInput { .. }));
        assert_eq!(hits.geocoder.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreachable_link_is_service_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let resolver = resolver_for("http://127.0.0.1:9");

        let err = resolver
            .resolve_url(&format!("http://{addr}/short/viewport"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WindEstimatorError::ServiceUnavailable {
                service: Upstream::MapLink,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_geocoder_failure_skips_context_fallback() {
        let hits = Hits::default();
        let app = Router::new()
            .route(
                "/short/address",
                get(|| async { Redirect::to("/maps/place/123+Main+St,+Springfield,+IL/") }),
            )
            .route("/maps/{*rest}", get(|| async { "map page" }))
            .route(
                "/search",
                get(|State(hits): State<Hits>| async move {
                    hits.geocoder.fetch_add(1, Ordering::SeqCst);
                    axum::http::StatusCode::BAD_GATEWAY
                }),
            )
            .with_state(hits.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let base = format!("http://{addr}");
        let resolver = resolver_for(&base);

        let err = resolver
            .resolve_url(&format!("{base}/short/address"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WindEstimatorError::ServiceUnavailable {
                service: Upstream::Geocoding,
                ..
            }
        ));
        assert_eq!(hits.geocoder.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_returns_ranked_candidates() {
        let (base, _hits) = fake_upstream().await;
        let resolver = resolver_for(&base);

        let results = resolver.search("  Paris ").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["display_name"], "Paris, France");
    }

    #[tokio::test]
    async fn test_search_errors() {
        let (base, _hits) = fake_upstream().await;
        let resolver = resolver_for(&base);

        assert!(matches!(
            resolver.search("   ").await,
            Err(WindEstimatorError::BadInput { .. })
        ));
        assert!(matches!(
            resolver.search("Atlantis").await,
            Err(WindEstimatorError::NotFound { .. })
        ));
    }
}
