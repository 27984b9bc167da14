use crate::state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Serving traffic with an optional integration missing or failing
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// The worse of the two.
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub component: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ComponentHealth {
    fn with(
        component: impl Into<String>,
        status: HealthStatus,
        error: Option<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            component: component.into(),
            status,
            error,
            timestamp: now(),
            details,
        }
    }

    pub fn healthy(component: impl Into<String>, details: serde_json::Value) -> Self {
        Self::with(component, HealthStatus::Healthy, None, Some(details))
    }

    pub fn degraded(component: impl Into<String>, error: impl Into<String>) -> Self {
        Self::with(component, HealthStatus::Degraded, Some(error.into()), None)
    }

    pub fn unhealthy(component: impl Into<String>, error: impl Into<String>) -> Self {
        Self::with(component, HealthStatus::Unhealthy, Some(error.into()), None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: i64,
    pub version: String,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let status = self.status.status_code();
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub status: HealthStatus,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_ready: Vec<String>,
}

impl IntoResponse for ReadinessResponse {
    fn into_response(self) -> Response {
        let status = if self.ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealthResponse {
    pub status: HealthStatus,
    pub timestamp: i64,
    pub components: BTreeMap<String, ComponentHealth>,
}

impl IntoResponse for ComponentHealthResponse {
    fn into_response(self) -> Response {
        let status = self.status.status_code();
        (status, Json(self)).into_response()
    }
}

/// Runs component checks against the live application state.
#[derive(Clone)]
pub struct HealthChecker {
    state: Arc<AppState>,
}

impl HealthChecker {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Healthy whenever the process can answer.
    pub fn liveness(&self) -> HealthResponse {
        HealthResponse {
            status: HealthStatus::Healthy,
            timestamp: now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Ready unless a required component is unhealthy. Degraded integrations do not block traffic.
    pub async fn readiness(&self) -> ReadinessResponse {
        let components = self.check_all_components().await;
        let mut overall = HealthStatus::Healthy;
        let mut not_ready = Vec::new();

        for (name, health) in &components {
            overall = overall.combine(health.status);
            if health.status == HealthStatus::Unhealthy {
                not_ready.push(name.clone());
            }
        }

        ReadinessResponse {
            ready: overall != HealthStatus::Unhealthy,
            status: overall,
            timestamp: now(),
            not_ready,
        }
    }

    pub async fn components(&self) -> ComponentHealthResponse {
        let components = self.check_all_components().await;
        let status = components
            .values()
            .fold(HealthStatus::Healthy, |acc, h| acc.combine(h.status));

        ComponentHealthResponse {
            status,
            timestamp: now(),
            components,
        }
    }

    async fn check_all_components(&self) -> BTreeMap<String, ComponentHealth> {
        let mut components = BTreeMap::new();
        components.insert("catalog".to_string(), self.check_catalog());
        components.insert("post_store".to_string(), self.check_post_store().await);
        components.insert("mailer".to_string(), self.check_mailer());
        components.insert("ai".to_string(), self.check_generator());
        components
    }

    fn check_catalog(&self) -> ComponentHealth {
        let catalog = self.state.catalog();
        if catalog.products().is_empty() || catalog.services().is_empty() || catalog.cities().is_empty()
        {
            return ComponentHealth::unhealthy("catalog", "catalog has an empty section");
        }
        ComponentHealth::healthy(
            "catalog",
            serde_json::json!({
                "products": catalog.products().len(),
                "services": catalog.services().len(),
                "cities": catalog.cities().len(),
            }),
        )
    }

    async fn check_post_store(&self) -> ComponentHealth {
        match self.state.posts().list().await {
            Ok(posts) => {
                let published = posts.iter().filter(|p| p.is_published()).count();
                ComponentHealth::healthy(
                    "post_store",
                    serde_json::json!({
                        "posts": posts.len(),
                        "published": published,
                    }),
                )
            }
            Err(e) => ComponentHealth::unhealthy("post_store", format!("failed to list posts: {e}")),
        }
    }

    fn check_mailer(&self) -> ComponentHealth {
        let mailer = self.state.mailer();
        if mailer.delivers() {
            ComponentHealth::healthy("mailer", serde_json::json!({ "provider": mailer.name() }))
        } else {
            ComponentHealth::degraded(
                "mailer",
                "no mail provider configured, notifications are only logged",
            )
        }
    }

    fn check_generator(&self) -> ComponentHealth {
        let generator = self.state.generator();
        if generator.is_configured() {
            ComponentHealth::healthy("ai", serde_json::json!({ "provider": generator.name() }))
        } else {
            ComponentHealth::degraded("ai", "no AI provider configured, draft generation disabled")
        }
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub async fn liveness_handler(State(checker): State<Arc<HealthChecker>>) -> impl IntoResponse {
    checker.liveness()
}

pub async fn readiness_handler(State(checker): State<Arc<HealthChecker>>) -> impl IntoResponse {
    checker.readiness().await
}

pub async fn components_handler(State(checker): State<Arc<HealthChecker>>) -> impl IntoResponse {
    checker.components().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::JsonFilePostStore;
    use crate::catalog::Catalog;
    use crate::config::ServerConfig;

    #[test]
    fn health_status_combine() {
        assert_eq!(
            HealthStatus::Healthy.combine(HealthStatus::Degraded),
            HealthStatus::Degraded
        );
        assert_eq!(
            HealthStatus::Degraded.combine(HealthStatus::Unhealthy),
            HealthStatus::Unhealthy
        );
        assert_eq!(
            HealthStatus::Healthy.combine(HealthStatus::Healthy),
            HealthStatus::Healthy
        );
    }

    #[test]
    fn health_status_codes() {
        assert_eq!(HealthStatus::Degraded.status_code(), StatusCode::OK);
        assert_eq!(
            HealthStatus::Unhealthy.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn unconfigured_integrations_are_degraded_but_ready() {
        let state = AppState::new(
            Arc::new(ServerConfig::default()),
            Catalog::try_builtin().unwrap(),
            Arc::new(JsonFilePostStore::in_memory()),
        )
        .unwrap();
        let checker = HealthChecker::new(Arc::new(state));

        let components = checker.components().await;
        assert_eq!(components.status, HealthStatus::Degraded);
        assert_eq!(components.components["catalog"].status, HealthStatus::Healthy);
        assert_eq!(components.components["post_store"].status, HealthStatus::Healthy);
        assert_eq!(components.components["mailer"].status, HealthStatus::Degraded);
        assert_eq!(components.components["ai"].status, HealthStatus::Degraded);

        let readiness = checker.readiness().await;
        assert!(readiness.ready);
        assert!(readiness.not_ready.is_empty());
    }
}
