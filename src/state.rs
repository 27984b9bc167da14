use crate::ai::{ContentGenerator, DisabledGenerator, GeminiGenerator};
use crate::blog::{JsonFilePostStore, PostStore};
use crate::catalog::{Catalog, OfferingKind};
use crate::config::ServerConfig;
use crate::mail::{BrevoMailer, LogMailer, Mailer, NotificationRenderer};
use crate::metrics::METRICS;
use crate::rate_limit::RateLimiter;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state handed to every request handler.
pub struct AppState {
    config: Arc<ServerConfig>,
    catalog: Arc<Catalog>,
    posts: Arc<dyn PostStore>,
    rate_limiter: Arc<RateLimiter>,
    notifications: NotificationRenderer,
    mailer: Arc<dyn Mailer>,
    generator: Arc<dyn ContentGenerator>,
    /// SHA-256 of the admin token; `None` disables the admin API
    admin_token_digest: Option<[u8; 32]>,
}

impl AppState {
    /// Wires up production collaborators from `config`.
    ///
    /// Fails when the built-in catalog is invalid or the post store cannot be read.
    pub async fn from_config(config: Arc<ServerConfig>) -> Result<Self> {
        let catalog = Catalog::try_builtin().context("built-in catalog is invalid")?;
        let posts = JsonFilePostStore::open(config.posts_path())
            .await
            .with_context(|| format!("failed to open post store {:?}", config.posts_path()))?;

        let mailer: Arc<dyn Mailer> = match config.brevo_api_key.clone() {
            Some(key) => Arc::new(
                BrevoMailer::new(key, config.mail_settings().sender)
                    .context("failed to build Brevo client")?,
            ),
            None => {
                warn!("no Brevo API key configured, contact notifications will only be logged");
                Arc::new(LogMailer)
            }
        };

        let generator: Arc<dyn ContentGenerator> = match config.gemini_api_key.clone() {
            Some(key) => Arc::new(
                GeminiGenerator::new(key, config.gemini_model.clone())
                    .context("failed to build Gemini client")?,
            ),
            None => {
                info!("no Gemini API key configured, draft generation disabled");
                Arc::new(DisabledGenerator)
            }
        };

        Self::new(config, catalog, Arc::new(posts))
            .map(|state| state.with_mailer(mailer).with_generator(generator))
    }

    /// State with logging-only mail and no AI provider.
    pub fn new(
        config: Arc<ServerConfig>,
        catalog: Catalog,
        posts: Arc<dyn PostStore>,
    ) -> Result<Self> {
        let notifications = NotificationRenderer::new(config.mail_settings())
            .context("failed to compile notification template")?;
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit_config()));
        let admin_token_digest = config.admin_token.as_deref().map(digest);

        for kind in [OfferingKind::Product, OfferingKind::Service] {
            let count = catalog.offerings(kind).len() * catalog.cities().len();
            METRICS.set_seo_pages(kind, count);
        }

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            posts,
            rate_limiter,
            notifications,
            mailer: Arc::new(LogMailer),
            generator: Arc::new(DisabledGenerator),
            admin_token_digest,
        })
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn ContentGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn config(&self) -> Arc<ServerConfig> {
        self.config.clone()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn posts(&self) -> &Arc<dyn PostStore> {
        &self.posts
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    pub fn notifications(&self) -> &NotificationRenderer {
        &self.notifications
    }

    pub fn mailer(&self) -> &Arc<dyn Mailer> {
        &self.mailer
    }

    pub fn generator(&self) -> &Arc<dyn ContentGenerator> {
        &self.generator
    }

    pub fn admin_enabled(&self) -> bool {
        self.admin_token_digest.is_some()
    }

    /// Compares digests so the comparison does not depend on token length.
    pub fn admin_token_matches(&self, presented: &str) -> bool {
        match &self.admin_token_digest {
            Some(expected) => {
                let presented = digest(presented);
                expected
                    .iter()
                    .zip(presented.iter())
                    .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                    == 0
            }
            None => false,
        }
    }

    /// Refreshes the blog post gauges from the store.
    pub async fn refresh_post_metrics(&self) {
        match self.posts.list().await {
            Ok(posts) => METRICS.update_blog_posts(&posts),
            Err(error) => warn!(%error, "failed to count posts for metrics"),
        }
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}
