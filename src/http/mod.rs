//! HTTP surface: JSON for the front end, XML for the sitemap, plain text for
//! robots.txt and metrics.

pub mod admin;
pub mod blog;
pub mod contact;
pub mod extract;
pub mod middleware;
pub mod pages;

use axum::Router;
use axum::extract::OriginalUri;
use axum::http::StatusCode;
use axum::routing::{get, post};
use std::sync::Arc;

use crate::error::ApiError;
use crate::health::{self, HealthChecker};
use crate::metrics::METRICS;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let health_checker = Arc::new(HealthChecker::new(state.clone()));
    let health_routes = Router::new()
        .route("/health", get(health::liveness_handler))
        .route("/ready", get(health::readiness_handler))
        .route("/health/components", get(health::components_handler))
        .with_state(health_checker);

    let admin_routes = Router::new()
        .route(
            "/admin/posts",
            get(admin::list_posts).post(admin::create_post),
        )
        .route("/admin/posts/generate", post(admin::generate_draft))
        .route(
            "/admin/posts/{id}",
            get(admin::get_post)
                .put(admin::update_post)
                .delete(admin::delete_post),
        )
        .route("/admin/posts/{id}/publish", post(admin::publish_post))
        .route("/admin/posts/{id}/unpublish", post(admin::unpublish_post));

    Router::new()
        .route("/", get(pages::home))
        .route("/products", get(pages::list_products))
        .route("/products/{slug}", get(pages::product_page))
        .route("/services", get(pages::list_services))
        .route("/services/{slug}", get(pages::service_page))
        .route("/locations", get(pages::locations))
        .route("/blog", get(blog::list))
        .route("/blog/{slug}", get(blog::show))
        .route("/api/contact", post(contact::submit))
        .route("/sitemap.xml", get(pages::sitemap))
        .route("/robots.txt", get(pages::robots))
        .merge(admin_routes)
        .with_state(state)
        .merge(health_routes)
        .route("/metrics", get(metrics_handler))
        .fallback(not_found)
        .layer(axum::middleware::from_fn(middleware::track_requests))
}

async fn metrics_handler() -> (StatusCode, String) {
    (StatusCode::OK, METRICS.encode())
}

async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found()
        .message(format!("no route for {}", uri.path()))
        .build()
}
