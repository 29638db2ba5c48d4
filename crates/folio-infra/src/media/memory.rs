use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use folio_core::ports::{ImageStore, MediaError, checked_media_path};

use super::{decodes_as_image, suffixed};

/// Images kept in a `HashMap` keyed by media path. Lost on restart.
#[derive(Default)]
pub struct InMemoryImageStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.read().await.get(path).cloned()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    fn is_image(&self, content: &[u8]) -> bool {
        decodes_as_image(content)
    }

    async fn save(&self, path: &str, content: &[u8]) -> Result<String, MediaError> {
        let path = checked_media_path(path)?;
        let mut files = self.files.write().await;

        let mut name = path.to_string();
        while files.contains_key(&name) {
            name = suffixed(path);
        }
        files.insert(name.clone(), content.to_vec());
        Ok(name)
    }
}
