//! Image stores for uploaded post pictures: local disk, or memory for tests
//! and ephemeral deployments.

mod local;
mod memory;

pub use local::LocalImageStore;
pub use memory::InMemoryImageStore;

use uuid::Uuid;

/// Decodes `content` fully; a recognised header alone is not enough.
fn decodes_as_image(content: &[u8]) -> bool {
    match image::load_from_memory(content) {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!(error = %e, bytes = content.len(), "Upload is not a readable image");
            false
        }
    }
}

/// `path` with a short random suffix before the extension,
/// `posts/small.gif` -> `posts/small_1a2b3c4.gif`.
fn suffixed(path: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    let suffix = &token[..7];
    let (dir, name) = match path.rsplit_once('/') {
        Some((dir, name)) => (format!("{dir}/"), name),
        None => (String::new(), path),
    };
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{dir}{stem}_{suffix}.{ext}"),
        _ => format!("{dir}{name}_{suffix}"),
    }
}
