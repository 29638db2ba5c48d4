//! Application state - shared across all handlers.

use std::sync::Arc;

use folio_core::ports::{Cache, ImageStore, PasswordService, TokenService};
use folio_core::services::{
    AccountService, FeedConfig, FeedService, FollowService, PostService, Repositories,
};
use folio_infra::{
    Argon2PasswordService, InMemoryCache, InMemoryStore, JwtTokenService, LocalImageStore,
};

use crate::config::AppConfig;

/// Services and collaborators every request may need.
#[derive(Clone)]
pub struct AppState {
    pub feeds: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub follows: Arc<FollowService>,
    pub accounts: Arc<AccountService>,
    pub tokens: Arc<dyn TokenService>,
    pub cache: Arc<dyn Cache>,
}

impl AppState {
    /// Wire services over the given stores.
    pub fn from_parts(
        repos: Repositories,
        cache: Arc<dyn Cache>,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
        images: Arc<dyn ImageStore>,
        feed: FeedConfig,
    ) -> Self {
        Self {
            feeds: Arc::new(FeedService::new(repos.clone(), feed)),
            posts: Arc::new(PostService::new(repos.clone(), images)),
            follows: Arc::new(FollowService::new(repos.clone())),
            accounts: Arc::new(AccountService::new(repos.users, passwords, tokens.clone())),
            tokens,
            cache,
        }
    }

    /// Build the state from configuration, falling back to in-memory stores
    /// when a backend is not configured or unreachable.
    pub async fn new(config: &AppConfig) -> Self {
        let repos = Self::repositories(config).await;
        let cache = Self::cache(config).await;

        tracing::info!(
            page_size = config.feed.page_size,
            index_cache_secs = config.feed.index_cache_ttl.as_secs(),
            media_root = %config.media_root.display(),
            "Application state initialized"
        );

        Self::from_parts(
            repos,
            cache,
            Arc::new(JwtTokenService::new(config.jwt.clone())),
            Arc::new(Argon2PasswordService::new()),
            Arc::new(LocalImageStore::new(config.media_root.clone())),
            config.feed.clone(),
        )
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> Repositories {
        use migration::{Migrator, MigratorTrait};

        let Some(db_config) = &config.database else {
            tracing::warn!("DATABASE_URL not set. Running with the in-memory store.");
            return Repositories::from_store(Arc::new(InMemoryStore::new()));
        };

        match folio_infra::database::connect(db_config).await {
            Ok(db) => {
                if config.run_migrations {
                    match Migrator::up(&db, None).await {
                        Ok(()) => tracing::info!("Migrations applied"),
                        Err(e) => tracing::error!(error = %e, "Failed to apply migrations"),
                    }
                }
                folio_infra::repositories(db)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to database. Using in-memory store.");
                Repositories::from_store(Arc::new(InMemoryStore::new()))
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(_config: &AppConfig) -> Repositories {
        tracing::info!("Running without postgres feature - using the in-memory store");
        Repositories::from_store(Arc::new(InMemoryStore::new()))
    }

    #[cfg(feature = "redis")]
    async fn cache(config: &AppConfig) -> Arc<dyn Cache> {
        use folio_infra::{RedisCache, RedisConfig};

        let Some(url) = &config.redis_url else {
            return Arc::new(InMemoryCache::new());
        };

        match RedisCache::connect(RedisConfig::new(url.clone())).await {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable. Caching pages in memory.");
                Arc::new(InMemoryCache::new())
            }
        }
    }

    #[cfg(not(feature = "redis"))]
    async fn cache(_config: &AppConfig) -> Arc<dyn Cache> {
        Arc::new(InMemoryCache::new())
    }
}
