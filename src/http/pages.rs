//! Marketing pages, city landing pages, sitemap and robots.txt.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::sync::Arc;

use crate::catalog::{City, Offering, OfferingKind};
use crate::error::ApiError;
use crate::seo::{CityIndex, GeneratedPage};
use crate::sitemap::{render_sitemap, robots_txt, sitemap_entries};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteOverview {
    pub products: Vec<Offering>,
    pub services: Vec<Offering>,
    pub cities: Vec<City>,
    pub landing_pages: usize,
}

/// An offering with links to each of its city pages.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferingDetail {
    #[serde(flatten)]
    pub offering: Offering,
    pub path: String,
    pub city_pages: Vec<CityPageLink>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityPageLink {
    pub city: String,
    pub city_name: String,
    pub path: String,
}

pub async fn home(State(state): State<Arc<AppState>>) -> Json<SiteOverview> {
    let catalog = state.catalog();
    let landing_pages =
        (catalog.products().len() + catalog.services().len()) * catalog.cities().len();
    Json(SiteOverview {
        products: catalog.products().to_vec(),
        services: catalog.services().to_vec(),
        cities: catalog.cities().to_vec(),
        landing_pages,
    })
}

pub async fn list_products(State(state): State<Arc<AppState>>) -> Json<Vec<Offering>> {
    Json(state.catalog().products().to_vec())
}

pub async fn list_services(State(state): State<Arc<AppState>>) -> Json<Vec<Offering>> {
    Json(state.catalog().services().to_vec())
}

pub async fn locations(State(state): State<Arc<AppState>>) -> Json<Vec<CityIndex>> {
    Json(state.catalog().matrix_by_city())
}

pub async fn product_page(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    offering_page(&state, OfferingKind::Product, &slug)
}

pub async fn service_page(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    offering_page(&state, OfferingKind::Service, &slug)
}

/// A city landing page when `slug` is `<entity>-<city>`, else the offering itself.
fn offering_page(state: &AppState, kind: OfferingKind, slug: &str) -> Result<Response, ApiError> {
    let catalog = state.catalog();
    if let Some(page) = catalog.resolve_city_page(kind, slug) {
        return Ok(Json::<GeneratedPage>(page).into_response());
    }

    let offering = catalog
        .offerings(kind)
        .iter()
        .find(|o| o.slug() == slug)
        .ok_or_else(|| {
            ApiError::not_found()
                .message(format!("no {kind} page '{slug}'"))
                .suggestion(format!("see {} for the full list", kind.path_prefix()))
                .build()
        })?;

    let city_pages = catalog
        .cities()
        .iter()
        .map(|city| CityPageLink {
            city: city.slug().to_string(),
            city_name: city.name().to_string(),
            path: format!("{}/{}-{}", kind.path_prefix(), offering.slug(), city.slug()),
        })
        .collect();

    Ok(Json(OfferingDetail {
        offering: offering.clone(),
        path: format!("{}/{}", kind.path_prefix(), offering.slug()),
        city_pages,
    })
    .into_response())
}

pub async fn sitemap(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let config = state.config();
    let posts = state.posts().list().await?;
    let entries = sitemap_entries(&config.base_url, state.catalog(), &posts);
    let xml = render_sitemap(&entries)
        .map_err(|e| ApiError::internal().message(format!("failed to render sitemap: {e}")).build())?;

    let cache_control = format!("public, max-age={}", config.sitemap_revalidate_secs);
    let mut response = (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/xml; charset=utf-8"),
        )],
        xml,
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&cache_control) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    tracing::debug!(urls = entries.len(), "sitemap rendered");
    Ok(response)
}

pub async fn robots(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        robots_txt(&state.config().base_url),
    )
}
