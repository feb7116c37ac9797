use serde::Deserialize;
use url::Url;

fn default_timeout_secs() -> u64 {
    10
}

fn default_refresh_interval_secs() -> u64 {
    3600
}

/// Settings for the catalog backend the directory is loaded from.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CatalogConfig {
    /// Base URL of the catalog backend. Required; may also come from the environment.
    #[serde(default)]
    pub backend_url: Option<Url>,
    /// Sent as `x-publishable-api-key` when set.
    #[serde(default)]
    pub publishable_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Freshness window of a directory snapshot.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            backend_url: None,
            publishable_key: None,
            timeout_secs: default_timeout_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}
