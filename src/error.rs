//! Error handling for the HTTP surface
//!
//! This module provides:
//! - Application error codes with HTTP status and metric category
//! - `ApiError`, a JSON-serializable error with suggestions and retry hints
//! - A builder for constructing errors
//! - Process-wide error telemetry

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ai::GenerationError;
use crate::blog::BlogError;
use crate::contact::ContactError;
use crate::mail::MailError;

// =============================================================================
// ERROR CODES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Request body could not be parsed
    InvalidRequest,
    /// A field failed validation
    ValidationError,
    /// Missing or wrong admin credentials
    Unauthorized,
    /// Page, post or route does not exist
    NotFound,
    /// Slug already taken by another post
    Conflict,
    /// Client exceeded the contact rate limit
    RateLimited,
    /// Mail or AI provider failed
    UpstreamError,
    /// Optional integration is not configured
    ServiceUnavailable,
    /// Anything else
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidRequest | ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::UpstreamError => StatusCode::BAD_GATEWAY,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::RateLimited | ErrorCode::UpstreamError | ErrorCode::InternalError
        )
    }

    /// Get the error category for metrics
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest | ErrorCode::ValidationError => "client_error",
            ErrorCode::Unauthorized => "auth_error",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::RateLimited => "rate_limited",
            ErrorCode::UpstreamError | ErrorCode::ServiceUnavailable => "upstream_error",
            ErrorCode::InternalError => "server_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.status().as_u16())
    }
}

// =============================================================================
// API ERROR
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    /// Unique error ID for correlating logs with responses
    pub error_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    pub retryable: bool,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            error_id: Self::generate_error_id(),
            field: None,
            suggestions: Vec::new(),
            retry_after: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn builder(code: ErrorCode) -> ErrorBuilder {
        ErrorBuilder::new(code)
    }

    pub fn validation() -> ErrorBuilder {
        ErrorBuilder::new(ErrorCode::ValidationError)
    }

    pub fn not_found() -> ErrorBuilder {
        ErrorBuilder::new(ErrorCode::NotFound)
    }

    pub fn internal() -> ErrorBuilder {
        ErrorBuilder::new(ErrorCode::InternalError)
    }

    pub fn track(&self) {
        ERROR_METRICS.record_error(&self.code);
    }

    fn generate_error_id() -> String {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let count = COUNTER.fetch_add(1, Ordering::Relaxed);
        let timestamp = chrono::Utc::now().timestamp_millis();
        format!("err_{:x}_{:x}", timestamp, count)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.track();
        if self.code.status().is_server_error() {
            tracing::error!(error_id = %self.error_id, code = %self.code, "{}", self.message);
        } else {
            tracing::debug!(error_id = %self.error_id, code = %self.code, "{}", self.message);
        }

        let retry_after = self.retry_after;
        let mut response = (self.code.status(), Json(self)).into_response();
        if let Some(seconds) = retry_after
            && let Ok(value) = HeaderValue::from_str(&seconds.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}

// =============================================================================
// ERROR BUILDER
// =============================================================================

pub struct ErrorBuilder {
    error: ApiError,
}

impl ErrorBuilder {
    fn new(code: ErrorCode) -> Self {
        Self {
            error: ApiError::new(code, ""),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.error.message = message.into();
        self
    }

    /// Name the request field that failed
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.error.field = Some(field.into());
        self
    }

    pub fn suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.error.suggestions.push(suggestion.into());
        self
    }

    pub fn retry_after(mut self, seconds: u64) -> Self {
        self.error.retry_after = Some(seconds);
        self.error.retryable = true;
        self
    }

    pub fn build(self) -> ApiError {
        self.error
    }
}

// =============================================================================
// ERROR TELEMETRY
// =============================================================================

#[derive(Debug, Default)]
pub struct ErrorMetrics {
    error_counts: RwLock<HashMap<ErrorCode, AtomicU64>>,
    category_counts: RwLock<HashMap<&'static str, AtomicU64>>,
}

impl ErrorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_error(&self, code: &ErrorCode) {
        {
            let map = self.error_counts.read();
            if let Some(counter) = map.get(code) {
                counter.fetch_add(1, Ordering::Relaxed);
            } else {
                drop(map);
                self.error_counts
                    .write()
                    .entry(*code)
                    .or_insert_with(|| AtomicU64::new(0))
                    .fetch_add(1, Ordering::Relaxed);
            }
        }

        let category = code.category();
        {
            let map = self.category_counts.read();
            if let Some(counter) = map.get(category) {
                counter.fetch_add(1, Ordering::Relaxed);
            } else {
                drop(map);
                self.category_counts
                    .write()
                    .entry(category)
                    .or_insert_with(|| AtomicU64::new(0))
                    .fetch_add(1, Ordering::Relaxed);
            }
        }

        tracing::debug!(error_code = %code, category = category, "error recorded");
    }

    pub fn get_error_count(&self, code: &ErrorCode) -> u64 {
        self.error_counts
            .read()
            .get(code)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn get_category_count(&self, category: &str) -> u64 {
        self.category_counts
            .read()
            .get(category)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

pub static ERROR_METRICS: once_cell::sync::Lazy<ErrorMetrics> =
    once_cell::sync::Lazy::new(ErrorMetrics::new);

// =============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// =============================================================================

impl From<ContactError> for ApiError {
    fn from(error: ContactError) -> Self {
        let field = error.field();
        ApiError::validation()
            .message(error.to_string())
            .field(field)
            .build()
    }
}

impl From<BlogError> for ApiError {
    fn from(error: BlogError) -> Self {
        match &error {
            BlogError::NotFound(_) => ApiError::not_found().message(error.to_string()).build(),
            BlogError::SlugTaken(_) => ApiError::builder(ErrorCode::Conflict)
                .message(error.to_string())
                .suggestion("choose a different slug or omit it to derive one from the title")
                .build(),
            BlogError::InvalidSlug(_) | BlogError::Validation { .. } => ApiError::validation()
                .message(error.to_string())
                .build(),
            BlogError::Io(_) | BlogError::Serialization(_) => {
                ApiError::internal().message(error.to_string()).build()
            }
        }
    }
}

const MAIL_UNAVAILABLE_MESSAGE: &str = "could not send your enquiry, please try again later";

impl From<MailError> for ApiError {
    fn from(error: MailError) -> Self {
        match error {
            MailError::Template(_) => ApiError::internal().message(error.to_string()).build(),
            // Provider details are logged by the caller, never returned to visitors.
            MailError::Http(_) | MailError::Rejected { .. } => {
                ApiError::builder(ErrorCode::UpstreamError)
                    .message(MAIL_UNAVAILABLE_MESSAGE)
                    .build()
            }
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(error: GenerationError) -> Self {
        match error {
            GenerationError::NotConfigured => ApiError::builder(ErrorCode::ServiceUnavailable)
                .message(error.to_string())
                .suggestion("set gemini_api_key to enable draft generation")
                .build(),
            GenerationError::InvalidTopic => ApiError::validation()
                .message(error.to_string())
                .field("topic")
                .build(),
            _ => ApiError::builder(ErrorCode::UpstreamError)
                .message(error.to_string())
                .build(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::internal().message(format!("{error:#}")).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(ErrorCode::ValidationError.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ErrorCode::UpstreamError.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_error_builder() {
        let error = ApiError::validation()
            .message("email is not a valid address")
            .field("email")
            .suggestion("use name@example.com")
            .build();

        assert_eq!(error.code, ErrorCode::ValidationError);
        assert_eq!(error.field.as_deref(), Some("email"));
        assert_eq!(error.suggestions.len(), 1);
        assert!(!error.retryable);
        assert!(error.error_id.starts_with("err_"));
    }

    #[test]
    fn test_error_metrics() {
        let metrics = ErrorMetrics::new();
        metrics.record_error(&ErrorCode::NotFound);
        metrics.record_error(&ErrorCode::NotFound);
        metrics.record_error(&ErrorCode::ValidationError);

        assert_eq!(metrics.get_error_count(&ErrorCode::NotFound), 2);
        assert_eq!(metrics.get_category_count("not_found"), 2);
        assert_eq!(metrics.get_category_count("client_error"), 1);
        assert_eq!(metrics.get_error_count(&ErrorCode::Conflict), 0);
    }

    #[test]
    fn test_rate_limited_response_sets_retry_after() {
        let response = ApiError::builder(ErrorCode::RateLimited)
            .message("too many requests")
            .retry_after(42)
            .build()
            .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }
}
