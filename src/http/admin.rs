//! Authenticated blog management.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::extract::{AdminAuth, ApiJson};
use crate::ai::GenerationRequest;
use crate::blog::{BlogPost, NewPost, PostPatch, PostStatus};
use crate::error::ApiError;
use crate::log_slow_operation;
use crate::state::AppState;

const SLOW_GENERATION_MS: u64 = 20_000;

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::not_found()
            .message(format!("post '{raw}' not found"))
            .build()
    })
}

pub async fn list_posts(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    Ok(Json(state.posts().list().await?))
}

pub async fn create_post(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(post): ApiJson<NewPost>,
) -> Result<(StatusCode, Json<BlogPost>), ApiError> {
    let created = state.posts().create(post).await?;
    state.refresh_post_metrics().await;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_post(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.posts().get(id).await?))
}

pub async fn update_post(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<PostPatch>,
) -> Result<Json<BlogPost>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.posts().update(id, patch).await?))
}

pub async fn delete_post(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.posts().delete(id).await?;
    state.refresh_post_metrics().await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_post(
    auth: AdminAuth,
    state: State<Arc<AppState>>,
    id: Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    set_status(auth, state, id, PostStatus::Published).await
}

pub async fn unpublish_post(
    auth: AdminAuth,
    state: State<Arc<AppState>>,
    id: Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    set_status(auth, state, id, PostStatus::Draft).await
}

async fn set_status(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    status: PostStatus,
) -> Result<Json<BlogPost>, ApiError> {
    let id = parse_id(&id)?;
    let post = state.posts().set_status(id, status).await?;
    state.refresh_post_metrics().await;
    Ok(Json(post))
}

/// `POST /admin/posts/generate`: stores an AI draft for editing.
pub async fn generate_draft(
    _auth: AdminAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<GenerationRequest>,
) -> Result<(StatusCode, Json<BlogPost>), ApiError> {
    let generator = state.generator();
    let started = Instant::now();
    let draft = generator.generate(&request).await?;
    log_slow_operation!(
        started.elapsed(),
        SLOW_GENERATION_MS,
        provider = generator.name(),
        "draft generation finished"
    );

    let excerpt = Some(draft.excerpt).filter(|e| !e.trim().is_empty());
    let created = state
        .posts()
        .create(NewPost {
            title: draft.title,
            slug: None,
            excerpt,
            content: draft.content,
            tags: draft.tags,
            cover_image_url: None,
            author: None,
        })
        .await?;
    state.refresh_post_metrics().await;

    tracing::info!(post.id = %created.id, post.slug = %created.slug, topic = %request.topic, "AI draft stored");
    Ok((StatusCode::CREATED, Json(created)))
}
