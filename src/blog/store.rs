use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    BlogError, BlogPost, DEFAULT_AUTHOR, NewPost, PostPatch, PostStatus, derive_excerpt,
    normalize_tags, validate_content, validate_title,
};
use crate::catalog::Slug;

/// Storage for blog posts.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// All posts, newest first.
    async fn list(&self) -> Result<Vec<BlogPost>, BlogError>;

    async fn get(&self, id: Uuid) -> Result<BlogPost, BlogError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, BlogError>;

    async fn create(&self, post: NewPost) -> Result<BlogPost, BlogError>;

    async fn update(&self, id: Uuid, patch: PostPatch) -> Result<BlogPost, BlogError>;

    async fn delete(&self, id: Uuid) -> Result<(), BlogError>;

    async fn set_status(&self, id: Uuid, status: PostStatus) -> Result<BlogPost, BlogError>;

    /// Writes any buffered state to durable storage.
    async fn flush(&self) -> Result<(), BlogError>;
}

/// In-memory post store, optionally mirrored to a JSON file.
///
/// Every mutation rewrites the file through a temporary file and a rename, so
/// a crash leaves either the old or the new snapshot on disk.
pub struct JsonFilePostStore {
    posts: RwLock<IndexMap<Uuid, BlogPost>>,
    path: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl JsonFilePostStore {
    pub fn in_memory() -> Self {
        Self {
            posts: RwLock::new(IndexMap::new()),
            path: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Loads `path` if it exists; otherwise starts empty and creates it on first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, BlogError> {
        let path = path.into();
        let posts = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let list: Vec<BlogPost> = serde_json::from_slice(&bytes)?;
                list.into_iter().map(|p| (p.id, p)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IndexMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(path = %path.display(), posts = posts.len(), "post store opened");

        Ok(Self {
            posts: RwLock::new(posts),
            path: Some(path),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.posts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.read().is_empty()
    }

    /// Applies `mutate` to a staged copy, writes it out, then publishes it.
    ///
    /// Readers never observe a change that failed to reach disk.
    async fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut IndexMap<Uuid, BlogPost>) -> Result<T, BlogError>,
    ) -> Result<T, BlogError> {
        let _guard = self.write_lock.lock().await;
        let mut staged = self.posts.read().clone();
        let output = mutate(&mut staged)?;
        self.write_snapshot(&staged).await?;
        *self.posts.write() = staged;
        Ok(output)
    }

    async fn write_snapshot(&self, posts: &IndexMap<Uuid, BlogPost>) -> Result<(), BlogError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        let snapshot: Vec<&BlogPost> = posts.values().collect();
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        tracing::debug!(path = %path.display(), posts = snapshot.len(), "post store persisted");
        Ok(())
    }

    fn slug_owner(posts: &IndexMap<Uuid, BlogPost>, slug: &Slug) -> Option<Uuid> {
        posts.values().find(|p| &p.slug == slug).map(|p| p.id)
    }

    /// Picks a free slug. An explicit slug must be free; a derived one gets a numeric suffix.
    fn claim_slug(
        posts: &IndexMap<Uuid, BlogPost>,
        explicit: Option<&str>,
        title: &str,
        owner: Option<Uuid>,
    ) -> Result<Slug, BlogError> {
        let taken = |slug: &Slug| {
            Self::slug_owner(posts, slug).is_some_and(|id| Some(id) != owner)
        };

        if let Some(explicit) = explicit {
            let slug = Slug::new(explicit.trim())?;
            if taken(&slug) {
                return Err(BlogError::SlugTaken(slug.into_inner()));
            }
            return Ok(slug);
        }

        let base = Slug::from_title(title)?;
        if !taken(&base) {
            return Ok(base);
        }
        let mut n = 2;
        loop {
            let candidate = base.with_suffix(n)?;
            if !taken(&candidate) {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

#[async_trait]
impl PostStore for JsonFilePostStore {
    async fn list(&self) -> Result<Vec<BlogPost>, BlogError> {
        let mut posts: Vec<BlogPost> = self.posts.read().values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn get(&self, id: Uuid) -> Result<BlogPost, BlogError> {
        self.posts
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| BlogError::NotFound(id.to_string()))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, BlogError> {
        Ok(self.posts.read().values().find(|p| p.slug == slug).cloned())
    }

    async fn create(&self, post: NewPost) -> Result<BlogPost, BlogError> {
        let title = validate_title(&post.title)?;
        let content = validate_content(&post.content)?;
        let now = Utc::now();

        let created = self
            .commit(|posts| {
                let slug = Self::claim_slug(posts, post.slug.as_deref(), &title, None)?;
                let excerpt = post
                    .excerpt
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| derive_excerpt(&content));

                let created = BlogPost {
                    id: Uuid::new_v4(),
                    slug,
                    title,
                    excerpt,
                    content,
                    tags: normalize_tags(post.tags),
                    cover_image_url: post.cover_image_url.filter(|u| !u.trim().is_empty()),
                    author: post
                        .author
                        .filter(|a| !a.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
                    status: PostStatus::Draft,
                    created_at: now,
                    updated_at: now,
                    published_at: None,
                };
                posts.insert(created.id, created.clone());
                Ok(created)
            })
            .await?;

        tracing::info!(post.id = %created.id, post.slug = %created.slug, "post created");
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: PostPatch) -> Result<BlogPost, BlogError> {
        let updated = self
            .commit(|posts| {
                let Some(existing) = posts.get(&id).cloned() else {
                    return Err(BlogError::NotFound(id.to_string()));
                };
                let mut post = existing;

                if let Some(title) = patch.title {
                    post.title = validate_title(&title)?;
                }
                if let Some(slug) = patch.slug {
                    post.slug = Self::claim_slug(posts, Some(&slug), &post.title, Some(id))?;
                }
                if let Some(content) = patch.content {
                    post.content = validate_content(&content)?;
                }
                if let Some(excerpt) = patch.excerpt {
                    let excerpt = excerpt.trim().to_string();
                    post.excerpt = if excerpt.is_empty() {
                        derive_excerpt(&post.content)
                    } else {
                        excerpt
                    };
                }
                if let Some(tags) = patch.tags {
                    post.tags = normalize_tags(tags);
                }
                if let Some(url) = patch.cover_image_url {
                    post.cover_image_url = Some(url.trim().to_string()).filter(|u| !u.is_empty());
                }
                if let Some(author) = patch.author
                    && !author.trim().is_empty()
                {
                    post.author = author.trim().to_string();
                }
                post.updated_at = Utc::now();

                posts.insert(id, post.clone());
                Ok(post)
            })
            .await?;

        tracing::info!(post.id = %id, post.slug = %updated.slug, "post updated");
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), BlogError> {
        self.commit(|posts| {
            posts
                .shift_remove(&id)
                .map(drop)
                .ok_or_else(|| BlogError::NotFound(id.to_string()))
        })
        .await?;
        tracing::info!(post.id = %id, "post deleted");
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: PostStatus) -> Result<BlogPost, BlogError> {
        let updated = self
            .commit(|posts| {
                let post = posts
                    .get_mut(&id)
                    .ok_or_else(|| BlogError::NotFound(id.to_string()))?;
                post.transition(status, Utc::now());
                Ok(post.clone())
            })
            .await?;

        tracing::info!(post.id = %id, post.slug = %updated.slug, status = %status, "post status changed");
        Ok(updated)
    }

    async fn flush(&self) -> Result<(), BlogError> {
        let _guard = self.write_lock.lock().await;
        let snapshot = self.posts.read().clone();
        self.write_snapshot(&snapshot).await
    }
}
