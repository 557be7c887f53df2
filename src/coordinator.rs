//! Search orchestration: normalize the input, resolve an origin, fetch the
//! dataset snapshot, then filter and rank it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use futures::future::{AbortHandle, AbortRegistration, Abortable};
use tracing::{debug, info, instrument, warn};

use crate::ai::{CompletionClient, GeminiClient, UnconfiguredClient};
use crate::cache::PersistentCache;
use crate::config::FinderConfig;
use crate::data::{CachedSource, ObjectStoreSource, RestaurantSource};
use crate::error::{Result, SearchError};
use crate::filter::RestaurantFilter;
use crate::geocoding::{Geocoder, OpenMeteoGeocoder};
use crate::models::{
    Coordinates, Cuisine, DataSummary, RestaurantRecord, SearchInput, SearchRequest, SearchResponse,
};
use crate::normalizer::RequestNormalizer;

pub struct SearchCoordinator {
    normalizer: RequestNormalizer,
    source: Arc<dyn RestaurantSource>,
    geocoder: Option<Arc<dyn Geocoder>>,
    max_results: Option<usize>,
}

impl SearchCoordinator {
    pub fn new(normalizer: RequestNormalizer, source: Arc<dyn RestaurantSource>) -> Self {
        Self {
            normalizer,
            source,
            geocoder: None,
            max_results: None,
        }
    }

    /// Wire up the production collaborators described by `config`
    pub fn from_config(config: &FinderConfig) -> anyhow::Result<Self> {
        let client: Arc<dyn CompletionClient> = if config.ai.api_key.is_some() {
            Arc::new(GeminiClient::new(&config.ai).context("Failed to create Gemini client")?)
        } else {
            warn!("No AI API key configured; only structured searches will succeed");
            Arc::new(UnconfiguredClient)
        };
        let normalizer = RequestNormalizer::new(
            client,
            config.prompt.clone(),
            Duration::from_secs(config.ai.timeout_seconds.into()),
        );

        let source = CachedSource::new(
            ObjectStoreSource::from_config(&config.data)?,
            Duration::from_secs(u64::from(config.data.refresh_minutes) * 60),
        );

        let mut coordinator = Self::new(normalizer, Arc::new(source))
            .with_max_results(Some(config.defaults.max_results as usize));

        if config.geocoding.enabled {
            let cache = match PersistentCache::open(config.cache_dir()) {
                Ok(cache) => Some(Arc::new(cache)),
                Err(e) => {
                    warn!("Geocoding cache unavailable, continuing without it: {}", e);
                    None
                }
            };
            let geocoder = OpenMeteoGeocoder::new(&config.geocoding, cache)
                .context("Failed to create geocoding client")?;
            coordinator = coordinator.with_geocoder(Arc::new(geocoder));
        }

        Ok(coordinator)
    }

    #[must_use]
    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Default page size; `None` returns every match
    #[must_use]
    pub fn with_max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }

    /// Run one search with the default page size
    pub async fn search(&self, input: &SearchInput) -> Result<SearchResponse> {
        self.search_page(input, None).await
    }

    /// Run one search returning at most `limit` results. A `limit` of `None`
    /// means the default page size, which returns every match when unset.
    #[instrument(name = "search", skip_all)]
    pub async fn search_page(&self, input: &SearchInput, limit: Option<usize>) -> Result<SearchResponse> {
        let request = self.normalizer.normalize(input).await?;
        self.execute(request, limit.or(self.max_results)).await
    }

    /// Search that can be cancelled through the `AbortHandle` paired with
    /// `registration` until the request has been normalized. After that it
    /// runs to completion. `limit` behaves as in [`search_page`](Self::search_page).
    pub async fn search_abortable(
        &self,
        input: &SearchInput,
        limit: Option<usize>,
        registration: AbortRegistration,
    ) -> Result<SearchResponse> {
        let request = Abortable::new(self.normalizer.normalize(input), registration)
            .await
            .map_err(|_| {
                info!("Search cancelled before normalization finished");
                SearchError::Cancelled
            })??;
        self.execute(request, limit.or(self.max_results)).await
    }

    /// Pair of abort handle and registration for [`search_abortable`](Self::search_abortable)
    #[must_use]
    pub fn abort_pair() -> (AbortHandle, AbortRegistration) {
        AbortHandle::new_pair()
    }

    async fn execute(&self, mut request: SearchRequest, limit: Option<usize>) -> Result<SearchResponse> {
        let start = Instant::now();

        if request.origin.is_none() && request.max_distance.is_some() {
            request.origin = self.resolve_origin(&request.location).await?;
        }

        let snapshot = self.source.fetch_restaurants().await?;
        let mut response = RestaurantFilter::filter_page(&request, &snapshot, limit)?;
        response.elapsed = start.elapsed();

        info!(
            "Search for '{}' matched {} of {} restaurants in {:.3}s",
            request.location,
            response.total_count,
            snapshot.len(),
            response.elapsed.as_secs_f64()
        );
        Ok(response)
    }

    async fn resolve_origin(&self, location: &str) -> Result<Option<Coordinates>> {
        let Some(geocoder) = &self.geocoder else {
            debug!("No geocoder configured, distance falls back to place-name matching");
            return Ok(None);
        };

        let origin = geocoder.geocode(location).await?;
        if origin.is_none() {
            warn!(
                "Could not geocode '{}', distance falls back to place-name matching",
                location
            );
        }
        Ok(origin)
    }

    /// Counts over the current dataset snapshot
    pub async fn summary(&self) -> Result<DataSummary> {
        let snapshot = self.source.fetch_restaurants().await?;
        Ok(DataSummary::from_records(&snapshot))
    }

    pub async fn restaurant_by_id(&self, id: &str) -> Result<Option<RestaurantRecord>> {
        let snapshot = self.source.fetch_restaurants().await?;
        Ok(RestaurantFilter::by_id(&snapshot, id).cloned())
    }

    /// Highest-rated restaurants across the whole dataset
    pub async fn popular(&self, limit: usize) -> Result<Vec<RestaurantRecord>> {
        let snapshot = self.source.fetch_restaurants().await?;
        Ok(RestaurantFilter::popular(&snapshot, limit))
    }

    pub async fn by_cuisine(&self, cuisine: Cuisine, limit: usize) -> Result<Vec<RestaurantRecord>> {
        let snapshot = self.source.fetch_restaurants().await?;
        debug!("Listing up to {} {} restaurants", limit, cuisine);
        Ok(RestaurantFilter::by_cuisine(&snapshot, cuisine, limit))
    }
}
