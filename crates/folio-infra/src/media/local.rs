use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use folio_core::ports::{ImageStore, MediaError, checked_media_path};

use super::{decodes_as_image, suffixed};

fn storage_error(e: std::io::Error) -> MediaError {
    MediaError::Storage(e.to_string())
}

/// Images written below a media root directory on local disk.
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    fn is_image(&self, content: &[u8]) -> bool {
        decodes_as_image(content)
    }

    async fn save(&self, path: &str, content: &[u8]) -> Result<String, MediaError> {
        let path = checked_media_path(path)?;
        let mut name = path.to_string();

        let target = self.root.join(&name);
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).await.map_err(storage_error)?;
        }

        // `create_new` makes the existence check and the create one step.
        loop {
            let target = self.root.join(&name);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .await
            {
                Ok(mut file) => {
                    file.write_all(content).await.map_err(storage_error)?;
                    file.flush().await.map_err(storage_error)?;
                    tracing::info!(path = %name, bytes = content.len(), "Image saved");
                    return Ok(name);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => name = suffixed(path),
                Err(e) => return Err(storage_error(e)),
            }
        }
    }
}
