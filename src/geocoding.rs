//! Resolving a search location to coordinates
//!
//! Distance filtering needs an origin. The coordinator asks a [`Geocoder`]
//! for one when the request carries a `max_distance` but no coordinates.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::RngExt;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::cache::PersistentCache;
use crate::config::GeocodingConfig;
use crate::error::ServiceError;
use crate::models::Coordinates;

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best match for `place`, or `None` when nothing matches
    async fn geocode(&self, place: &str) -> Result<Option<Coordinates>, ServiceError>;
}

/// Open-Meteo geocoding API (no API key required)
pub struct OpenMeteoGeocoder {
    client: Client,
    base_url: String,
    cache: Option<Arc<PersistentCache>>,
    cache_ttl: Duration,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    admin1: Option<String>,
}

fn cache_key(place: &str) -> String {
    format!("geocode:{}", place.trim().to_lowercase())
}

impl OpenMeteoGeocoder {
    pub fn new(config: &GeocodingConfig, cache: Option<Arc<PersistentCache>>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("restaurant-finder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache,
            cache_ttl: Duration::from_hours(config.cache_ttl_hours.into()),
        })
    }

    async fn lookup(&self, place: &str) -> Result<Option<Coordinates>, ServiceError> {
        let url = format!(
            "{}/search?name={}&count=5&language=en&format=json",
            self.base_url,
            urlencoding::encode(place)
        );
        let start = Instant::now();

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ServiceError::RateLimited("geocoding API".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GeocodingResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Payload(format!("invalid geocoding response: {e}")))?;

        let results = parsed.results.unwrap_or_default();
        debug!(
            "Geocoding candidates: {:?}",
            results
                .iter()
                .map(|r| format!(
                    "{}{} ({:.4}, {:.4})",
                    r.name,
                    r.admin1.as_deref().map(|a| format!(", {a}")).unwrap_or_default(),
                    r.latitude,
                    r.longitude
                ))
                .collect::<Vec<_>>()
        );

        let best = results
            .into_iter()
            .find_map(|r| Coordinates::new(r.latitude, r.longitude));
        match &best {
            Some(coordinates) => info!(
                "Geocoded '{}' to {} in {:.3}s",
                place,
                coordinates.format_coordinates(),
                start.elapsed().as_secs_f64()
            ),
            None => warn!("No geocoding results found for '{}'", place),
        }
        Ok(best)
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, place: &str) -> Result<Option<Coordinates>, ServiceError> {
        // "lat,lon" needs no lookup
        if let Ok(coordinates) = place.parse::<Coordinates>() {
            return Ok(Some(coordinates));
        }

        let key = cache_key(place);
        if let Some(cache) = &self.cache {
            match cache.get::<Option<Coordinates>>(&key).await {
                Ok(Some(cached)) => return Ok(cached),
                Ok(None) => {}
                Err(e) => warn!("Geocoding cache read failed: {}", e),
            }
        }

        let coordinates = self.lookup(place).await?;

        if let Some(cache) = &self.cache {
            let jitter: f64 = rand::rng().random_range(0.9..1.1);
            let ttl = self.cache_ttl.mul_f64(jitter);
            if let Err(e) = cache.put(&key, coordinates, ttl).await {
                warn!("Geocoding cache write failed: {}", e);
            }
        }
        Ok(coordinates)
    }
}

/// Geocoder backed by a fixed table, for tests and offline use
#[derive(Debug, Default, Clone)]
pub struct StaticGeocoder {
    places: Vec<(String, Coordinates)>,
}

impl StaticGeocoder {
    #[must_use]
    pub fn with_place(mut self, place: &str, coordinates: Coordinates) -> Self {
        self.places.push((place.to_lowercase(), coordinates));
        self
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, place: &str) -> Result<Option<Coordinates>, ServiceError> {
        let wanted = place.trim().to_lowercase();
        Ok(self
            .places
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, coordinates)| *coordinates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_coordinates_skip_lookup() {
        let config = GeocodingConfig {
            // unroutable; a network call would fail the test
            base_url: "http://127.0.0.1:9".to_string(),
            ..GeocodingConfig::default()
        };
        let geocoder = OpenMeteoGeocoder::new(&config, None).unwrap();
        let coordinates = geocoder.geocode("34.05, -118.24").await.unwrap().unwrap();
        assert_eq!(coordinates.latitude, 34.05);
        assert_eq!(coordinates.longitude, -118.24);
    }

    #[tokio::test]
    async fn test_cached_result_is_served() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(PersistentCache::open(dir.path()).unwrap());
        let santa_monica = Coordinates::new(34.0195, -118.4912);
        cache
            .put(&cache_key("Santa Monica"), santa_monica, Duration::from_secs(60))
            .await
            .unwrap();

        let config = GeocodingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..GeocodingConfig::default()
        };
        let geocoder = OpenMeteoGeocoder::new(&config, Some(cache)).unwrap();
        assert_eq!(geocoder.geocode(" santa monica ").await.unwrap(), santa_monica);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let config = GeocodingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 2,
            ..GeocodingConfig::default()
        };
        let geocoder = OpenMeteoGeocoder::new(&config, None).unwrap();
        assert!(matches!(
            geocoder.geocode("Boston").await,
            Err(ServiceError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_static_geocoder() {
        let boston = Coordinates::new(42.3601, -71.0589).unwrap();
        let geocoder = StaticGeocoder::default().with_place("Boston", boston);
        assert_eq!(geocoder.geocode("boston").await.unwrap(), Some(boston));
        assert_eq!(geocoder.geocode("Paris").await.unwrap(), None);
    }
}
