//! Dataset fetched from an object store (S3 or local filesystem)

use std::sync::Arc;
use std::time::{Duration, Instant};

use ::object_store::ObjectStore;
use ::object_store::aws::AmazonS3Builder;
use ::object_store::local::LocalFileSystem;
use ::object_store::path::Path;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tokio::task;
use tracing::{info, instrument};

use super::decode::{self, DatasetFormat};
use super::{RestaurantSource, Snapshot};
use crate::config::{DataConfig, SourceKind};
use crate::error::ServiceError;

pub struct ObjectStoreSource {
    store: Arc<dyn ObjectStore>,
    path: Path,
    format: DatasetFormat,
    timeout: Duration,
}

impl ObjectStoreSource {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        key: &str,
        format: DatasetFormat,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            path: Path::from(key),
            format,
            timeout,
        }
    }

    /// Build the source described by the `[data]` config section.
    /// S3 credentials come from the standard AWS environment variables.
    pub fn from_config(config: &DataConfig) -> Result<Self> {
        let format = match config.format {
            Some(format) => format,
            None => DatasetFormat::from_key(&config.key).ok_or_else(|| {
                anyhow!(
                    "Cannot infer dataset format from '{}'; set data.format to csv or json",
                    config.key
                )
            })?,
        };
        let timeout = Duration::from_secs(config.timeout_seconds.into());

        let store: Arc<dyn ObjectStore> = match config.source {
            SourceKind::S3 => {
                let bucket = config
                    .bucket
                    .as_deref()
                    .context("data.bucket is required for the s3 source")?;
                let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
                if let Some(region) = &config.region {
                    builder = builder.with_region(region);
                }
                Arc::new(builder.build().context("Failed to configure S3 client")?)
            }
            SourceKind::Local => {
                let root = config
                    .root
                    .as_deref()
                    .context("data.root is required for the local source")?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(root)
                        .with_context(|| format!("Invalid dataset directory: {root}"))?,
                )
            }
        };

        Ok(Self::new(store, &config.key, format, timeout))
    }
}

#[async_trait]
impl RestaurantSource for ObjectStoreSource {
    #[instrument(name = "fetch_restaurants", skip(self), fields(path = %self.path))]
    async fn fetch_restaurants(&self) -> Result<Snapshot, ServiceError> {
        let start = Instant::now();

        let bytes = tokio::time::timeout(self.timeout, async {
            self.store.get(&self.path).await?.bytes().await
        })
        .await
        .map_err(|_| ServiceError::Timeout(self.timeout))??;

        let format = self.format;
        let dataset = task::spawn_blocking(move || decode::decode(&bytes, format))
            .await
            .map_err(|e| ServiceError::Payload(format!("decode task failed: {e}")))??;

        info!(
            "Loaded {} restaurants from {} in {:.3}s ({} rows skipped)",
            dataset.records.len(),
            self.path,
            start.elapsed().as_secs_f64(),
            dataset.skipped
        );
        Ok(Arc::new(dataset.records))
    }
}
