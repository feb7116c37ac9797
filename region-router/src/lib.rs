//! Storefront edge that keeps URLs and the correlation cookie in line with the visitor's region.

pub mod config;
mod cookie;
pub mod errors;
mod exclusions;
pub mod geo;
mod metrics_defs;
pub mod resolver;
mod service;
mod upstream;

#[cfg(test)]
mod testutils;

use errors::RegionRouterError;
use region_directory::RegionDirectory;
use service::RegionRouterService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;

pub use metrics_defs::ALL_METRICS;

/// Starts the storefront listener and the admin listener. Only returns on error.
///
/// `config` is expected to have passed [`config::Config::validate`].
pub async fn run(config: config::Config) -> Result<(), RegionRouterError> {
    let directory = RegionDirectory::from_config(&config.catalog)?;

    let warm_directory = directory.clone();
    tokio::spawn(async move {
        warm_directory.warm(&cookie::new_cache_id()).await;
    });

    let router_service = RegionRouterService::new(&config, directory.clone())?;
    let admin_service = AdminService::<_, RegionRouterError>::new(move || directory.is_ready());

    let router_task = run_http_service(&config.listener.host, config.listener.port, router_service);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(router_task, admin_task)?;
    Ok(())
}
