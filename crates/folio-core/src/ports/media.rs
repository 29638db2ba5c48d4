//! Media port - storage for uploaded post images.

use async_trait::async_trait;

/// Keeps uploaded image files under a media root (local disk, in-memory).
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Whether `content` decodes as a supported image.
    fn is_image(&self, content: &[u8]) -> bool;

    /// Store `content` at `path`, relative to the media root.
    ///
    /// An occupied path is never overwritten; the file gets a suffixed name
    /// instead. Returns the path actually used.
    async fn save(&self, path: &str, content: &[u8]) -> Result<String, MediaError>;
}

/// Media storage errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Invalid media path: {0}")]
    InvalidPath(String),

    #[error("Storage failed: {0}")]
    Storage(String),
}

/// `path` if it stays inside the media root: relative, `/`-separated, with
/// no empty, `.` or `..` segments.
pub fn checked_media_path(path: &str) -> Result<&str, MediaError> {
    let inside = !path.is_empty()
        && !path.contains('\\')
        && path
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
    if inside {
        Ok(path)
    } else {
        Err(MediaError::InvalidPath(path.to_string()))
    }
}
