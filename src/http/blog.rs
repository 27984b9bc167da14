//! Public blog routes. Drafts are invisible here.

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::blog::{BlogPost, published};
use crate::catalog::Slug;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub slug: Slug,
    pub title: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
    pub path: String,
}

impl From<BlogPost> for PostSummary {
    fn from(post: BlogPost) -> Self {
        let path = post.path();
        Self {
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            tags: post.tags,
            cover_image_url: post.cover_image_url,
            author: post.author,
            published_at: post.published_at,
            path,
        }
    }
}

/// `GET /blog`, newest publication first.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<PostSummary>>, ApiError> {
    let posts = published(state.posts().list().await?);
    Ok(Json(posts.into_iter().map(PostSummary::from).collect()))
}

/// `GET /blog/{slug}`
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    state
        .posts()
        .find_by_slug(&slug)
        .await?
        .filter(BlogPost::is_published)
        .map(Json)
        .ok_or_else(|| {
            ApiError::not_found()
                .message(format!("no blog post '{slug}'"))
                .build()
        })
}
