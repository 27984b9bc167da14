pub mod ai;
pub mod blog;
pub mod catalog;
pub mod config;
pub mod contact;
pub mod error;
pub mod health;
pub mod http;
pub mod logging;
pub mod mail;
pub mod metrics;
pub mod rate_limit;
pub mod seo;
pub mod shutdown;
pub mod sitemap;
pub mod state;

pub use config::{CliArgs, ServerConfig};
pub use error::{ApiError, ERROR_METRICS, ErrorCode};
pub use logging::{LoggingConfig, init_logging};
pub use seo::{
    ALL_PRODUCT_CITY_ROUTES, ALL_SERVICE_CITY_ROUTES, CityRoute, GeneratedPage,
    generate_product_city_pages, generate_service_city_pages, get_product_city_page,
    get_service_city_page,
};
pub use shutdown::ShutdownCoordinator;
pub use state::AppState;

use anyhow::Result;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let config = Arc::new(config);
    let state = Arc::new(AppState::from_config(config.clone()).await?);
    state.refresh_post_metrics().await;

    let catalog = state.catalog();
    tracing::info!(
        products = catalog.products().len(),
        services = catalog.services().len(),
        cities = catalog.cities().len(),
        mailer = state.mailer().name(),
        ai = state.generator().name(),
        admin_api = state.admin_enabled(),
        "starting gauge site backend",
    );

    let coordinator = Arc::new(ShutdownCoordinator::new(config.shutdown_timeout()));
    state
        .rate_limiter()
        .clone()
        .start_cleanup_task(coordinator.token());

    let router = http::router(state.clone());
    let listener = TcpListener::bind(config.http_bind_address).await?;
    let actual_addr = listener.local_addr()?;
    tracing::info!(bind = %actual_addr, base_url = %config.base_url, "listening");

    let signal_coordinator = coordinator.clone();
    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        signal_coordinator.wait_for_signal().await;
    })
    .into_future();

    coordinator.drain(server, &state).await
}
