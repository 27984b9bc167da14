//! AI-assisted blog drafts.
//!
//! A [`ContentGenerator`] turns a topic into a draft post. Drafts are never
//! published automatically; the admin API stores them for human editing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const MAX_TOPIC_CHARS: usize = 300;
const GEMINI_API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("AI draft generation is not configured")]
    NotConfigured,

    #[error("topic must be between 1 and 300 characters")]
    InvalidTopic,

    #[error("AI provider request failed: {0}")]
    Http(reqwest::Error),

    #[error("AI provider returned status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("AI provider returned no content")]
    EmptyResponse,

    #[error("AI provider returned malformed draft: {0}")]
    Malformed(String),
}

// Request URLs are dropped so they never reach responses or logs.
impl From<reqwest::Error> for GenerationError {
    fn from(error: reqwest::Error) -> Self {
        GenerationError::Http(error.without_url())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub tone: Option<String>,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), GenerationError> {
        let chars = self.topic.trim().chars().count();
        if chars == 0 || chars > MAX_TOPIC_CHARS {
            return Err(GenerationError::InvalidTopic);
        }
        Ok(())
    }

    fn prompt(&self) -> String {
        let mut prompt = format!(
            "Write a blog post for an Indian manufacturer of precision gauges \
             (plug, ring, thread and snap gauges, calibration services).\n\
             Topic: {}\n",
            self.topic.trim()
        );
        if !self.keywords.is_empty() {
            prompt.push_str(&format!("Work in these keywords: {}\n", self.keywords.join(", ")));
        }
        let tone = self.tone.as_deref().unwrap_or("professional and practical");
        prompt.push_str(&format!("Tone: {tone}\n"));
        prompt.push_str(
            "Respond with a single JSON object with the keys \"title\" (string), \
             \"excerpt\" (one sentence), \"content\" (Markdown) and \"tags\" (array of strings).",
        );
        prompt
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDraft {
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedDraft, GenerationError>;

    fn name(&self) -> &'static str;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Removes a surrounding Markdown code fence such as ```` ```json ... ``` ````.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parses the model's reply into a draft.
pub fn parse_draft(text: &str) -> Result<GeneratedDraft, GenerationError> {
    let json = strip_code_fences(text);
    let draft: GeneratedDraft =
        serde_json::from_str(json).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    if draft.title.trim().is_empty() || draft.content.trim().is_empty() {
        return Err(GenerationError::Malformed(
            "draft is missing a title or content".to_string(),
        ));
    }
    Ok(draft)
}

// =============================================================================
// GEMINI
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

pub struct GeminiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(api_key: String, model: String) -> Result<Self, GenerationError> {
        Self::with_base_url(DEFAULT_GEMINI_BASE_URL, api_key, model)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: String,
        model: String,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ContentGenerator for GeminiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedDraft, GenerationError> {
        request.validate()?;
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: request.prompt(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.7,
            },
        };

        let started = std::time::Instant::now();
        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header(GEMINI_API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GeminiResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .find(|t| !t.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        let draft = parse_draft(&text)?;
        tracing::info!(
            model = %self.model,
            topic = %request.topic,
            duration_ms = started.elapsed().as_millis() as u64,
            "draft generated"
        );
        Ok(draft)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Used when no API key is configured.
#[derive(Debug, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl ContentGenerator for DisabledGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedDraft, GenerationError> {
        Err(GenerationError::NotConfigured)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> GenerationRequest {
        GenerationRequest {
            topic: "Why thread gauges wear out".to_string(),
            keywords: vec!["thread plug gauge".to_string()],
            tone: None,
        }
    }

    fn gemini_reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
        })
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_draft_rejects_missing_content() {
        let err = parse_draft(r#"{"title": "T", "content": "  "}"#).unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
        let err = parse_draft("not json").unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[test]
    fn test_prompt_mentions_topic_and_keywords() {
        let prompt = request().prompt();
        assert!(prompt.contains("Why thread gauges wear out"));
        assert!(prompt.contains("thread plug gauge"));
        assert!(prompt.contains("professional and practical"));
    }

    #[tokio::test]
    async fn test_gemini_generator_parses_fenced_json() {
        let server = MockServer::start().await;
        let draft = "```json\n{\"title\": \"Thread Gauge Wear\", \"excerpt\": \"Why gauges wear.\", \"content\": \"## Wear\\n\\nFriction.\", \"tags\": [\"thread gauges\"]}\n```";
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(draft)))
            .expect(1)
            .mount(&server)
            .await;

        let generator = GeminiGenerator::with_base_url(
            server.uri(),
            "secret".to_string(),
            DEFAULT_GEMINI_MODEL.to_string(),
        )
        .unwrap();
        let generated = generator.generate(&request()).await.unwrap();

        assert_eq!(generated.title, "Thread Gauge Wear");
        assert_eq!(generated.tags, vec!["thread gauges"]);
    }

    #[tokio::test]
    async fn test_gemini_generator_reports_rejection_and_empty_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-goog-api-key", "bad"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(header("x-goog-api-key", "empty"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
            .mount(&server)
            .await;

        let model = DEFAULT_GEMINI_MODEL.to_string();
        let rejected = GeminiGenerator::with_base_url(server.uri(), "bad".to_string(), model.clone())
            .unwrap()
            .generate(&request())
            .await
            .unwrap_err();
        assert!(matches!(rejected, GenerationError::Rejected { status: 403, .. }));

        let empty = GeminiGenerator::with_base_url(server.uri(), "empty".to_string(), model)
            .unwrap()
            .generate(&request())
            .await
            .unwrap_err();
        assert!(matches!(empty, GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_api_key() {
        let generator = GeminiGenerator::with_base_url(
            "http://127.0.0.1:1",
            "TOPSECRETKEY".to_string(),
            "m".to_string(),
        )
        .unwrap();
        let error = generator.generate(&request()).await.unwrap_err();
        assert!(matches!(error, GenerationError::Http(_)));
        assert!(!error.to_string().contains("TOPSECRETKEY"));

        let body = serde_json::to_string(&crate::error::ApiError::from(error)).unwrap();
        assert!(body.contains("upstream_error"));
        assert!(!body.contains("TOPSECRETKEY"));
        assert!(!body.contains("127.0.0.1:1"));
    }

    #[tokio::test]
    async fn test_disabled_generator() {
        let generator = DisabledGenerator;
        assert!(!generator.is_configured());
        assert!(matches!(
            generator.generate(&request()).await,
            Err(GenerationError::NotConfigured)
        ));
    }

    #[test]
    fn test_blank_topic_is_invalid() {
        let request = GenerationRequest {
            topic: "   ".to_string(),
            ..Default::default()
        };
        assert!(matches!(request.validate(), Err(GenerationError::InvalidTopic)));
    }
}
