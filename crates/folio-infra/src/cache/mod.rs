//! Page cache backends: Redis when configured, in-memory otherwise.

mod memory;
#[cfg(feature = "redis")]
mod redis_cache;

pub use memory::InMemoryCache;
#[cfg(feature = "redis")]
pub use redis_cache::{RedisCache, RedisConfig};
