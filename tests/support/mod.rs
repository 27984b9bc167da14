#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use gauge_site::blog::JsonFilePostStore;
use gauge_site::catalog::Catalog;
use gauge_site::mail::{MailError, Mailer, OutgoingEmail};
use gauge_site::{AppState, ServerConfig};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::Value;
use tower::ServiceExt;

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        base_url: "https://gauges.test".to_string(),
        admin_token: Some(ADMIN_TOKEN.to_string()),
        contact_rate_limit: 2,
        contact_rate_window_secs: 60,
        ..ServerConfig::default()
    }
}

pub fn test_state(config: ServerConfig) -> AppState {
    let catalog = Catalog::try_builtin().expect("builtin catalog");
    AppState::new(
        Arc::new(config),
        catalog,
        Arc::new(JsonFilePostStore::in_memory()),
    )
    .expect("app state")
}

pub fn test_router() -> Router {
    gauge_site::http::router(Arc::new(test_state(test_config())))
}

/// Captures outgoing mail instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().push(email.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.expect("router responds")
}

pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    send(
        router,
        Request::builder().uri(uri).body(Body::empty()).expect("request"),
    )
    .await
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn admin_request(method: &str, uri: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {ADMIN_TOKEN}"));
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).expect("json body")
}

pub async fn expect_json(response: Response<Body>, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
