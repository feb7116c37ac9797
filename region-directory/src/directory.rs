use crate::catalog::{CatalogClient, RegionSource};
use crate::config::CatalogConfig;
use crate::metrics_defs::{
    DIRECTORY_CACHE_HIT, DIRECTORY_COUNTRIES, DIRECTORY_REFRESH, DIRECTORY_REFRESH_DURATION,
};
use crate::types::DirectorySnapshot;
use parking_lot::RwLock;
use shared::{counter, gauge, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(thiserror::Error, Debug)]
pub enum DirectoryError {
    #[error("catalog backend URL is not configured")]
    MissingBackendUrl,
    #[error("invalid catalog URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for header {0}")]
    InvalidHeader(&'static str),
    #[error("catalog request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("catalog responded with status {0}")]
    UpstreamStatus(u16),
}

struct DirectoryInner {
    source: Arc<dyn RegionSource>,
    snapshot: RwLock<Arc<DirectorySnapshot>>,
    max_age: Duration,
    // Used by the readiness probe. Set once any load has succeeded.
    ready: AtomicBool,
}

/// Shared, lazily refreshed country to region directory.
///
/// Cloning is cheap and every clone sees the same snapshot. Refreshes are not serialized:
/// concurrent callers that find the snapshot stale each fetch, and the last one to finish wins.
/// The lock is only held to read or swap the snapshot pointer, never across a fetch.
#[derive(Clone)]
pub struct RegionDirectory {
    inner: Arc<DirectoryInner>,
}

impl RegionDirectory {
    pub fn new(source: Arc<dyn RegionSource>, max_age: Duration) -> Self {
        RegionDirectory {
            inner: Arc::new(DirectoryInner {
                source,
                snapshot: RwLock::new(Arc::new(DirectorySnapshot::empty())),
                max_age,
                ready: AtomicBool::new(false),
            }),
        }
    }

    /// Builds a directory backed by the catalog described in `config`.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, DirectoryError> {
        let client = CatalogClient::new(config)?;
        Ok(Self::new(
            Arc::new(client),
            Duration::from_secs(config.refresh_interval_secs),
        ))
    }

    /// Returns a snapshot no older than the freshness window.
    ///
    /// An empty or stale snapshot triggers a fetch tagged with `correlation_token`. Fetch
    /// errors are returned to the caller and the previous snapshot stays in place.
    pub async fn resolve(
        &self,
        correlation_token: &str,
    ) -> Result<Arc<DirectorySnapshot>, DirectoryError> {
        let current = self.current();
        if !current.is_empty() && !current.is_stale(self.inner.max_age, Instant::now()) {
            counter!(DIRECTORY_CACHE_HIT).increment(1);
            return Ok(current);
        }

        self.refresh(correlation_token).await
    }

    /// Fetches the region list and swaps in a new snapshot regardless of freshness.
    pub async fn refresh(
        &self,
        correlation_token: &str,
    ) -> Result<Arc<DirectorySnapshot>, DirectoryError> {
        let start = Instant::now();
        let result = self.inner.source.fetch_regions(correlation_token).await;
        histogram!(DIRECTORY_REFRESH_DURATION).record(start.elapsed().as_secs_f64());

        let regions = match result {
            Ok(regions) => regions,
            Err(e) => {
                counter!(DIRECTORY_REFRESH, "result" => "error").increment(1);
                tracing::error!(error = %e, "Failed to refresh region directory");
                return Err(e);
            }
        };

        let snapshot = Arc::new(DirectorySnapshot::from_regions(regions, Instant::now()));
        if snapshot.is_empty() {
            tracing::warn!("Catalog returned no regions");
        }

        *self.inner.snapshot.write() = snapshot.clone();
        self.inner.ready.store(true, Ordering::Relaxed);

        counter!(DIRECTORY_REFRESH, "result" => "ok").increment(1);
        gauge!(DIRECTORY_COUNTRIES).set(snapshot.len() as f64);
        tracing::info!(countries = snapshot.len(), "Refreshed region directory");

        Ok(snapshot)
    }

    /// Eager load at startup. Failures are logged and left to the next request to retry.
    pub async fn warm(&self, correlation_token: &str) {
        if let Err(e) = self.refresh(correlation_token).await {
            tracing::warn!(error = %e, "Initial region directory load failed");
        }
    }

    /// The current snapshot, without checking freshness.
    pub fn current(&self) -> Arc<DirectorySnapshot> {
        self.inner.snapshot.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::Relaxed)
    }
}
