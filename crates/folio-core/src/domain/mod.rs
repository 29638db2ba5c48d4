//! Domain entities - the core business objects.

mod comment;
mod follow;
mod group;
mod post;
mod user;
mod validation;

pub use comment::{Comment, NewComment};
pub use follow::Follow;
pub use group::{GROUP_FIELD_MAX_LEN, Group, NewGroup, is_slug};
pub use post::{
    IMAGE_UPLOAD_DIR, INVALID_IMAGE, ImageUpload, NewPost, Post, PostContent, PostDraft, PostScope,
    image_path,
};
pub use user::{USERNAME_MAX_LEN, User};
pub use validation::FieldErrors;
