//! # Folio Infrastructure
//!
//! Concrete implementations of the ports defined in `folio-core`:
//! entity stores, the page cache, uploaded image storage and session
//! authentication.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL entity store via SeaORM
//! - `auth` - JWT sessions + Argon2 password hashing
//! - `redis` - Redis page cache

pub mod cache;
pub mod media;
pub mod memory;

#[cfg(feature = "postgres")]
pub mod database;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use cache::InMemoryCache;
pub use media::{InMemoryImageStore, LocalImageStore};
pub use memory::InMemoryStore;

#[cfg(feature = "postgres")]
pub use database::{DatabaseConfig, repositories};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
