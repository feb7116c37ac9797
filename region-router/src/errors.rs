use crate::config::ValidationError;
use region_directory::DirectoryError;
use thiserror::Error;

/// Errors that can occur while serving storefront requests
#[derive(Error, Debug)]
pub enum RegionRouterError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("Region directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Upstream request failed for {0}: {1}")]
    UpstreamRequestFailed(String, String),

    #[error("Upstream timeout for {0}")]
    UpstreamTimeout(String),

    #[error("Hyper error: {0}")]
    Hyper(#[from] hyper::Error),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
