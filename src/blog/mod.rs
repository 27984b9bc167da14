//! Blog posts authored through the admin API.
//!
//! Posts start as drafts (hand-written or AI-generated), are edited, then
//! published. Only published posts are visible on the public blog routes and
//! in the sitemap.

mod store;

pub use store::{JsonFilePostStore, PostStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::{Slug, SlugError};

const MAX_TITLE_CHARS: usize = 200;
const EXCERPT_CHARS: usize = 160;
pub const DEFAULT_AUTHOR: &str = "Editorial Team";

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("post '{0}' not found")]
    NotFound(String),

    #[error("slug '{0}' is already used by another post")]
    SlugTaken(String),

    #[error("invalid slug: {0}")]
    InvalidSlug(#[from] SlugError),

    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("post store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("post store is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub slug: Slug,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    pub author: String,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl BlogPost {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    pub fn path(&self) -> String {
        format!("/blog/{}", self.slug)
    }

    /// Moves the post to `status`. The first publication date is kept forever.
    pub fn transition(&mut self, status: PostStatus, now: DateTime<Utc>) {
        if status == PostStatus::Published && self.published_at.is_none() {
            self.published_at = Some(now);
        }
        self.status = status;
        self.updated_at = now;
    }
}

/// Fields for a new post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    /// Derived from the title when absent
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub cover_image_url: Option<String>,
    pub author: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    /// An empty string removes the cover image
    pub cover_image_url: Option<String>,
    pub author: Option<String>,
}

pub(crate) fn validate_title(title: &str) -> Result<String, BlogError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(BlogError::Validation {
            field: "title",
            message: "title is required".to_string(),
        });
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(BlogError::Validation {
            field: "title",
            message: format!("title must be at most {MAX_TITLE_CHARS} characters"),
        });
    }
    Ok(title.to_string())
}

pub(crate) fn validate_content(content: &str) -> Result<String, BlogError> {
    if content.trim().is_empty() {
        return Err(BlogError::Validation {
            field: "content",
            message: "content is required".to_string(),
        });
    }
    Ok(content.to_string())
}

pub(crate) fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// First paragraph of `content`, cut on a word boundary.
pub fn derive_excerpt(content: &str) -> String {
    let paragraph = content
        .split("\n\n")
        .map(|p| p.trim().trim_start_matches('#').trim())
        .find(|p| !p.is_empty())
        .unwrap_or_default();
    let flat = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        return flat;
    }

    let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
    let trimmed = match cut.rfind(' ') {
        Some(idx) => &cut[..idx],
        None => cut.as_str(),
    };
    format!("{}...", trimmed.trim_end_matches(|c: char| c.is_ascii_punctuation()))
}

/// Published posts, newest publication first.
pub fn published(mut posts: Vec<BlogPost>) -> Vec<BlogPost> {
    posts.retain(BlogPost::is_published);
    posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    posts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_excerpt_uses_first_paragraph() {
        let content = "## Why calibrate?\n\nGauges wear.\n\nSecond paragraph.";
        assert_eq!(derive_excerpt(content), "Why calibrate?");
        assert_eq!(derive_excerpt("Gauges wear over time."), "Gauges wear over time.");
    }

    #[test]
    fn test_derive_excerpt_truncates_on_word_boundary() {
        let content = "word ".repeat(100);
        let excerpt = derive_excerpt(&content);
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.chars().count() <= EXCERPT_CHARS + 3);
        assert!(!excerpt.contains("wor..."));
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(vec![
            " Calibration ".to_string(),
            "calibration".to_string(),
            String::new(),
            "Thread Gauges".to_string(),
        ]);
        assert_eq!(tags, vec!["calibration", "thread gauges"]);
    }

    #[test]
    fn test_transition_keeps_first_publication_date() {
        let created = Utc::now();
        let mut post = BlogPost {
            id: Uuid::new_v4(),
            slug: Slug::new("gauge-care").unwrap(),
            title: "Gauge care".to_string(),
            excerpt: String::new(),
            content: "Keep gauges oiled.".to_string(),
            tags: vec![],
            cover_image_url: None,
            author: DEFAULT_AUTHOR.to_string(),
            status: PostStatus::Draft,
            created_at: created,
            updated_at: created,
            published_at: None,
        };

        let first = created + chrono::Duration::minutes(5);
        post.transition(PostStatus::Published, first);
        assert_eq!(post.published_at, Some(first));

        post.transition(PostStatus::Draft, first + chrono::Duration::minutes(1));
        post.transition(PostStatus::Published, first + chrono::Duration::minutes(2));
        assert_eq!(post.published_at, Some(first));
        assert!(post.is_published());
    }

    #[test]
    fn test_status_parses_from_str() {
        assert_eq!("draft".parse::<PostStatus>().unwrap(), PostStatus::Draft);
        assert_eq!(PostStatus::Published.to_string(), "published");
    }
}
