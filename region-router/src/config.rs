use region_directory::config::CatalogConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const BACKEND_URL_ENV: &str = "MEDUSA_BACKEND_URL";
pub const PUBLISHABLE_KEY_ENV: &str = "MEDUSA_PUBLISHABLE_KEY";
pub const DEFAULT_REGION_ENV: &str = "MEDUSA_DEFAULT_REGION";

const DEFAULT_REGION: &str = "us";

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Catalog backend URL is not configured (set catalog.backend_url or MEDUSA_BACKEND_URL)")]
    MissingBackendUrl,

    #[error("Default region cannot be empty")]
    EmptyDefaultRegion,

    #[error("Invalid geo header name: {0:?}")]
    InvalidGeoHeader(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidOverride { name: &'static str, reason: String },
}

/// Region router configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Main listener for storefront traffic
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    pub admin_listener: Listener,
    /// Storefront upstream that pass-through requests are forwarded to
    pub upstream: Url,
    /// Origin used to build redirect locations, e.g. `https://shop.example.com`.
    /// Derived from the request's Host header when unset.
    #[serde(default)]
    pub public_origin: Option<String>,
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Region used when nothing else resolves, and as the redirect target when no
    /// regions are configured.
    #[serde(default = "default_region")]
    pub default_region: String,
    #[serde(default)]
    pub geo: GeoConfig,
    #[serde(default)]
    pub exclusions: ExclusionConfig,
}

fn default_upstream_timeout_secs() -> u64 {
    30
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl Config {
    /// Applies `MEDUSA_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV) {
            let parsed = Url::parse(&url).map_err(|e| ValidationError::InvalidOverride {
                name: BACKEND_URL_ENV,
                reason: e.to_string(),
            })?;
            self.catalog.backend_url = Some(parsed);
        }

        if let Some(key) = lookup(PUBLISHABLE_KEY_ENV) {
            self.catalog.publishable_key = Some(key);
        }

        if let Some(region) = lookup(DEFAULT_REGION_ENV) {
            self.default_region = region;
        }

        Ok(())
    }

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ValidationError> {
        self.apply_overrides(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
    }

    /// Validates the router configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.catalog.backend_url.is_none() {
            return Err(ValidationError::MissingBackendUrl);
        }

        if self.default_region.trim().is_empty() {
            return Err(ValidationError::EmptyDefaultRegion);
        }

        if let GeoConfig::Headers { primary, secondary } = &self.geo {
            for name in std::iter::once(primary).chain(secondary) {
                http::HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| ValidationError::InvalidGeoHeader(name.clone()))?;
            }
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Which hosting platform supplies geolocation headers.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeoConfig {
    #[default]
    Vercel,
    Cloudflare,
    Headers {
        primary: String,
        #[serde(default)]
        secondary: Option<String>,
    },
    None,
}

/// Paths forwarded without any region handling.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ExclusionConfig {
    /// Leading path segments, e.g. `api` or `_next/static`
    #[serde(default = "default_excluded_prefixes")]
    pub prefixes: Vec<String>,
    /// File extensions of the final path segment, without the dot
    #[serde(default = "default_excluded_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        ExclusionConfig {
            prefixes: default_excluded_prefixes(),
            extensions: default_excluded_extensions(),
        }
    }
}

fn default_excluded_prefixes() -> Vec<String> {
    [
        "api",
        "_next/static",
        "_next/image",
        "favicon.ico",
        "images",
        "assets",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_excluded_extensions() -> Vec<String> {
    ["png", "svg", "jpg", "jpeg", "gif", "webp"]
        .into_iter()
        .map(String::from)
        .collect()
}
