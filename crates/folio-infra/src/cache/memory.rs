//! Process-local cache, used when no Redis URL is configured.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use folio_core::ports::{Cache, CacheError};

struct Slot {
    body: String,
    deadline: Option<Instant>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline.is_none_or(|deadline| now < deadline)
    }
}

/// Rendered pages keyed by request path, held in a `HashMap`.
///
/// Entries vanish on restart and are not shared between workers of
/// different processes.
#[derive(Default)]
pub struct InMemoryCache {
    slots: RwLock<HashMap<String, Slot>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entry count; expired slots are not counted.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.slots
            .read()
            .await
            .values()
            .filter(|slot| slot.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        {
            let slots = self.slots.read().await;
            let slot = slots.get(key)?;
            if slot.is_live(now) {
                return Some(slot.body.clone());
            }
        }

        self.slots.write().await.remove(key);
        None
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut slots = self.slots.write().await;
        slots.retain(|_, slot| slot.is_live(now));
        slots.insert(
            key.to_string(),
            Slot {
                body: value.to_string(),
                deadline: ttl.map(|ttl| now + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.slots.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|key, _| !key.starts_with(prefix));
        tracing::debug!(prefix, removed = before - slots.len(), "Cache prefix cleared");
        Ok(())
    }
}
