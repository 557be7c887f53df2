//! Restaurant dataset collaborators
//!
//! The dataset is fetched wholesale and shared as an immutable snapshot.
//! Sources:
//! - [`ObjectStoreSource`]: a CSV or JSON object in S3 or on local disk
//! - [`InMemorySource`]: fixed records, for tests and embedding
//! - [`CachedSource`]: wraps another source and refetches after an interval

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::ServiceError;
use crate::models::RestaurantRecord;

pub mod decode;
pub mod store;

pub use decode::{DatasetFormat, DecodedDataset};
pub use store::ObjectStoreSource;

/// Read-only view of the dataset shared by concurrent searches
pub type Snapshot = Arc<Vec<RestaurantRecord>>;

#[async_trait]
pub trait RestaurantSource: Send + Sync {
    /// Fetch the full current dataset
    async fn fetch_restaurants(&self) -> Result<Snapshot, ServiceError>;
}

/// A fixed, in-memory dataset
pub struct InMemorySource {
    records: Snapshot,
}

impl InMemorySource {
    #[must_use]
    pub fn new(records: Vec<RestaurantRecord>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }
}

#[async_trait]
impl RestaurantSource for InMemorySource {
    async fn fetch_restaurants(&self) -> Result<Snapshot, ServiceError> {
        Ok(Arc::clone(&self.records))
    }
}

/// Keeps the last fetched snapshot and refetches once it is older than
/// `refresh_after`
pub struct CachedSource<S> {
    inner: S,
    refresh_after: Duration,
    state: RwLock<Option<(Instant, Snapshot)>>,
}

impl<S: RestaurantSource> CachedSource<S> {
    pub fn new(inner: S, refresh_after: Duration) -> Self {
        Self {
            inner,
            refresh_after,
            state: RwLock::new(None),
        }
    }

    fn fresh(&self, state: &Option<(Instant, Snapshot)>) -> Option<Snapshot> {
        state
            .as_ref()
            .filter(|(fetched_at, _)| fetched_at.elapsed() < self.refresh_after)
            .map(|(_, snapshot)| Arc::clone(snapshot))
    }
}

#[async_trait]
impl<S: RestaurantSource> RestaurantSource for CachedSource<S> {
    async fn fetch_restaurants(&self) -> Result<Snapshot, ServiceError> {
        if let Some(snapshot) = self.fresh(&*self.state.read().await) {
            debug!("Serving cached dataset snapshot ({} records)", snapshot.len());
            return Ok(snapshot);
        }

        let mut state = self.state.write().await;
        // another task may have refreshed while we waited for the lock
        if let Some(snapshot) = self.fresh(&state) {
            return Ok(snapshot);
        }

        let snapshot = self.inner.fetch_restaurants().await?;
        info!("Refreshed dataset snapshot: {} records", snapshot.len());
        *state = Some((Instant::now(), Arc::clone(&snapshot)));
        Ok(snapshot)
    }
}
