use crate::config::CatalogConfig;
use crate::directory::DirectoryError;
use crate::types::Region;
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;

const REGIONS_PATH: &str = "store/regions";
const PUBLISHABLE_KEY_HEADER: &str = "x-publishable-api-key";
const CACHE_TAG_HEADER: &str = "x-cache-tag";

/// Where the directory gets its regions from.
#[async_trait]
pub trait RegionSource: Send + Sync {
    /// Fetches the full region list. The correlation token tags the request so the
    /// backend can invalidate cached responses per client.
    async fn fetch_regions(&self, correlation_token: &str) -> Result<Vec<Region>, DirectoryError>;
}

#[derive(Deserialize)]
struct CatalogCountry {
    iso_2: Option<String>,
}

#[derive(Deserialize)]
struct CatalogRegion {
    id: Option<String>,
    countries: Option<Vec<CatalogCountry>>,
}

#[derive(Deserialize)]
struct RegionsResponse {
    regions: Option<Vec<CatalogRegion>>,
}

impl From<CatalogRegion> for Region {
    // Missing ids and country codes become empty strings instead of failing the load.
    fn from(region: CatalogRegion) -> Self {
        Region {
            id: region.id.unwrap_or_default(),
            countries: region
                .countries
                .unwrap_or_default()
                .into_iter()
                .map(|c| c.iso_2.unwrap_or_default())
                .collect(),
        }
    }
}

/// HTTP client for the catalog backend's region listing.
pub struct CatalogClient {
    client: reqwest::Client,
    regions_url: Option<String>,
    publishable_key: Option<String>,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, DirectoryError> {
        let regions_url = config
            .backend_url
            .as_ref()
            .map(|base| format!("{}/{}", base.as_str().trim_end_matches('/'), REGIONS_PATH));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(CatalogClient {
            client,
            regions_url,
            publishable_key: config.publishable_key.clone(),
        })
    }

    fn headers(&self, correlation_token: &str) -> Result<HeaderMap, DirectoryError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.publishable_key {
            let value = HeaderValue::from_str(key)
                .map_err(|_| DirectoryError::InvalidHeader(PUBLISHABLE_KEY_HEADER))?;
            headers.insert(PUBLISHABLE_KEY_HEADER, value);
        }

        let tag = HeaderValue::from_str(&format!("regions-{correlation_token}"))
            .map_err(|_| DirectoryError::InvalidHeader(CACHE_TAG_HEADER))?;
        headers.insert(CACHE_TAG_HEADER, tag);

        Ok(headers)
    }
}

#[async_trait]
impl RegionSource for CatalogClient {
    async fn fetch_regions(&self, correlation_token: &str) -> Result<Vec<Region>, DirectoryError> {
        let regions_url = self
            .regions_url
            .as_deref()
            .ok_or(DirectoryError::MissingBackendUrl)?;
        let url =
            Url::parse(regions_url).map_err(|e| DirectoryError::InvalidUrl(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .headers(self.headers(correlation_token)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::UpstreamStatus(status.as_u16()));
        }

        let body = response.json::<RegionsResponse>().await?;
        let regions: Vec<Region> = body
            .regions
            .unwrap_or_default()
            .into_iter()
            .map(Region::from)
            .collect();

        tracing::debug!(regions = regions.len(), "Fetched regions from catalog");
        Ok(regions)
    }
}
