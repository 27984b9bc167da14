//! Request extractors shared by the handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::{ApiError, ErrorCode};
use crate::log_security_event;
use crate::state::AppState;

const MAX_CLIENT_KEY_LEN: usize = 64;

/// Identifies the caller for rate limiting.
///
/// First `X-Forwarded-For` entry, then `X-Real-IP`, then the peer address,
/// otherwise `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl<S> FromRequestParts<S> for ClientKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let key = forwarded_for(&parts.headers)
            .or_else(|| header_value(&parts.headers, "x-real-ip"))
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());
        Ok(Self(key))
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    sanitize(raw.split(',').next()?)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    sanitize(headers.get(name)?.to_str().ok()?)
}

fn sanitize(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || value.len() > MAX_CLIENT_KEY_LEN {
        return None;
    }
    value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b':' || b == b'-')
        .then(|| value.to_string())
}

/// Proof that the request carried the admin bearer token.
///
/// Rejects with 404 when the admin API is disabled and 401 on a missing or
/// wrong token.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if !state.admin_enabled() {
            return Err(ApiError::not_found()
                .message(format!("no route for {}", parts.uri.path()))
                .build());
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        match token {
            Some(token) if state.admin_token_matches(token) => Ok(AdminAuth),
            Some(_) => {
                log_security_event!("admin_token_rejected", path = %parts.uri.path(), "invalid admin token");
                Err(unauthorized("invalid admin token"))
            }
            None => Err(unauthorized("missing bearer token")),
        }
    }
}

fn unauthorized(message: &str) -> ApiError {
    ApiError::builder(ErrorCode::Unauthorized)
        .message(message)
        .suggestion("send 'Authorization: Bearer <admin token>'")
        .build()
}

/// `Json` whose rejection is an [`ApiError`] body.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::builder(ErrorCode::InvalidRequest)
                .message(rejection.body_text())
                .build()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    async fn client_key(request: HttpRequest<()>) -> String {
        let (mut parts, _) = request.into_parts();
        let ClientKey(key) = ClientKey::from_request_parts(&mut parts, &()).await.unwrap();
        key
    }

    #[tokio::test]
    async fn forwarded_for_wins() {
        let request = HttpRequest::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "198.51.100.2")
            .body(())
            .unwrap();
        assert_eq!(client_key(request).await, "203.0.113.7");
    }

    #[tokio::test]
    async fn falls_back_to_real_ip_then_peer() {
        let request = HttpRequest::builder()
            .header("x-real-ip", "198.51.100.2")
            .body(())
            .unwrap();
        assert_eq!(client_key(request).await, "198.51.100.2");

        let mut request = HttpRequest::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 40000))));
        assert_eq!(client_key(request).await, "192.0.2.1");

        let request = HttpRequest::builder().body(()).unwrap();
        assert_eq!(client_key(request).await, "unknown");
    }

    #[tokio::test]
    async fn garbage_forwarded_header_is_ignored() {
        let request = HttpRequest::builder()
            .header("x-forwarded-for", "<script>")
            .body(())
            .unwrap();
        assert_eq!(client_key(request).await, "unknown");
    }
}
