use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FieldErrors;
use super::validation::preview;

/// Directory prefix stored in front of uploaded image names.
pub const IMAGE_UPLOAD_DIR: &str = "posts/";

const IMAGE_EXTENSIONS: &[&str] = &["gif", "png", "jpg", "jpeg", "webp", "bmp"];

pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

const EMPTY_FILE: &str = "The submitted file is empty.";

/// Post entity - a text entry written by one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl Post {
    /// Replace the editable fields. Author and publication date never change.
    ///
    /// An edit without a new image keeps the current one.
    pub fn apply(&mut self, content: PostContent) {
        self.text = content.text;
        self.group_id = content.group_id;
        if content.image.is_some() {
            self.image = content.image;
        }
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(preview(&self.text, 15))
    }
}

/// A post that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub pub_date: DateTime<Utc>,
    pub content: PostContent,
}

impl NewPost {
    pub fn new(author_id: Uuid, content: PostContent) -> Self {
        Self {
            author_id,
            pub_date: Utc::now(),
            content,
        }
    }
}

/// An image file as uploaded with a post form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ImageUpload {
    /// File name given by the client.
    pub file_name: String,
    pub content: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("bytes", &self.content.len())
            .finish()
    }
}

/// Raw post submission, as received from a form.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<ImageUpload>,
}

/// Validated editable fields of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl PostDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_group(mut self, group_id: i64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_image(mut self, upload: ImageUpload) -> Self {
        self.image = Some(upload);
        self
    }

    /// Shape checks only. Whether the group exists and whether the image
    /// content decodes are up to the caller.
    ///
    /// A valid image yields its storage path under [`IMAGE_UPLOAD_DIR`].
    pub fn validate(&self) -> Result<PostContent, FieldErrors> {
        let mut errors = FieldErrors::new();

        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", "This field is required.");
        }

        let image = match &self.image {
            None => None,
            Some(upload) if upload.content.is_empty() => {
                errors.add("image", EMPTY_FILE);
                None
            }
            Some(upload) => match image_path(upload.file_name.trim()) {
                Some(path) => Some(path),
                None => {
                    errors.add("image", INVALID_IMAGE);
                    None
                }
            },
        };

        errors.into_result()?;

        Ok(PostContent {
            text: text.to_string(),
            group_id: self.group_id,
            image,
        })
    }
}

/// Storage path for an uploaded image name, `None` if it is not an image.
pub fn image_path(upload_name: &str) -> Option<String> {
    let base = upload_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|b| !b.is_empty())?;
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .contains(&ext.as_str())
        .then(|| format!("{IMAGE_UPLOAD_DIR}{base}"))
}

/// Which posts a feed query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(i64),
    Author(Uuid),
    /// Posts whose author is followed by this user.
    FollowedBy(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_text() {
        let errors = PostDraft::new("   ").validate().unwrap_err();
        assert_eq!(
            errors.get("text"),
            Some(&["This field is required.".to_string()][..])
        );
    }

    #[test]
    fn test_validate_trims_and_normalizes_image() {
        let content = PostDraft::new("  Тестовый текст \n")
            .with_group(3)
            .with_image(ImageUpload::new("C:\\uploads\\small.gif", b"GIF89a".to_vec()))
            .validate()
            .unwrap();

        assert_eq!(content.text, "Тестовый текст");
        assert_eq!(content.group_id, Some(3));
        assert_eq!(content.image.as_deref(), Some("posts/small.gif"));
    }

    #[test]
    fn test_validate_rejects_bad_uploads() {
        let errors = PostDraft::new("Текст")
            .with_image(ImageUpload::new("notes.txt", b"hello".to_vec()))
            .validate()
            .unwrap_err();
        assert_eq!(errors.get("image"), Some(&[INVALID_IMAGE.to_string()][..]));

        let errors = PostDraft::new("Текст")
            .with_image(ImageUpload::new("small.gif", Vec::new()))
            .validate()
            .unwrap_err();
        assert_eq!(errors.get("image"), Some(&[EMPTY_FILE.to_string()][..]));
    }

    #[test]
    fn test_image_path_rejects_non_images() {
        assert_eq!(image_path("notes.txt"), None);
        assert_eq!(image_path(".gif"), None);
        assert_eq!(image_path("dir/"), None);
        assert_eq!(image_path("photo.JPG").as_deref(), Some("posts/photo.JPG"));
    }

    #[test]
    fn test_apply_keeps_author_date_and_image() {
        let mut post = Post {
            id: 1,
            text: "Текст".to_string(),
            pub_date: Utc::now(),
            author_id: Uuid::new_v4(),
            group_id: Some(1),
            image: Some("posts/small.gif".to_string()),
        };
        let before = post.clone();

        post.apply(PostContent {
            text: "Измененный текст".to_string(),
            group_id: None,
            image: None,
        });

        assert_eq!(post.text, "Измененный текст");
        assert_eq!(post.group_id, None);
        assert_eq!(post.image, before.image);
        assert_eq!(post.author_id, before.author_id);
        assert_eq!(post.pub_date, before.pub_date);
    }

    #[test]
    fn test_display_is_first_fifteen_chars() {
        let post = Post {
            id: 1,
            text: "Тестовый текст первые 15 символов".to_string(),
            pub_date: Utc::now(),
            author_id: Uuid::new_v4(),
            group_id: None,
            image: None,
        };
        assert_eq!(post.to_string().chars().count(), 15);
    }
}
