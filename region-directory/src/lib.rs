//! Country code to region directory for the storefront edge.
//!
//! The directory is loaded lazily from the catalog backend (`GET /store/regions`) and
//! refreshed once the current snapshot is older than the configured freshness window.

pub mod catalog;
pub mod config;
pub mod directory;
mod metrics_defs;
pub mod types;

#[cfg(test)]
mod testutils;

pub use catalog::{CatalogClient, RegionSource};
pub use directory::{DirectoryError, RegionDirectory};
pub use metrics_defs::ALL_METRICS;
pub use types::{DirectorySnapshot, Region};
