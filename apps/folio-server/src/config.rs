//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use folio_core::services::FeedConfig;
use folio_infra::JwtConfig;

#[cfg(feature = "postgres")]
use folio_infra::DatabaseConfig;

use crate::telemetry::TelemetryConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` keeps every entity in process memory.
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    /// Apply pending migrations before serving.
    pub run_migrations: bool,
    /// `None` caches index pages in process memory.
    pub redis_url: Option<String>,
    /// Directory uploaded post images are written under.
    pub media_root: PathBuf,
    pub feed: FeedConfig,
    pub jwt: JwtConfig,
    pub telemetry: TelemetryConfig,
}

/// Parse `raw`, falling back to `default` when absent or malformed.
fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn var_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or(env::var(key).ok(), default)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let feed_defaults = FeedConfig::default();
        let jwt_defaults = JwtConfig::default();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: var_or("PORT", 8080),
            #[cfg(feature = "postgres")]
            database: non_empty("DATABASE_URL").map(|url| DatabaseConfig {
                url,
                max_connections: var_or("DB_MAX_CONNECTIONS", 20),
                min_connections: var_or("DB_MIN_CONNECTIONS", 2),
            }),
            run_migrations: var_or("RUN_MIGRATIONS", false),
            redis_url: non_empty("REDIS_URL"),
            media_root: non_empty("MEDIA_ROOT")
                .map_or_else(|| PathBuf::from("media"), PathBuf::from),
            feed: FeedConfig {
                page_size: var_or("POSTS_PER_PAGE", feed_defaults.page_size).max(1),
                index_cache_ttl: Duration::from_secs(var_or(
                    "INDEX_CACHE_SECONDS",
                    feed_defaults.index_cache_ttl.as_secs(),
                )),
            },
            jwt: JwtConfig {
                secret: non_empty("JWT_SECRET").unwrap_or(jwt_defaults.secret),
                expiration_hours: var_or("JWT_EXPIRATION_HOURS", jwt_defaults.expiration_hours),
                issuer: non_empty("JWT_ISSUER").unwrap_or(jwt_defaults.issuer),
            },
            telemetry: TelemetryConfig::from_env(),
        }
    }
}
