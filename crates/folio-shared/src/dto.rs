//! Data Transfer Objects - submitted forms and template contexts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `?page=` query parameter. Kept as text so junk values fall back to page 1.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// `?next=` query parameter of the login page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Text fields of the create/edit post form. The image arrives as a separate
/// multipart file part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    /// Group id as submitted; empty means no group.
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Submitted values and per-field errors, for re-rendering a form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormState {
    pub values: BTreeMap<String, String>,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl FormState {
    pub fn with_value(mut self, field: &str, value: impl Into<String>) -> Self {
        self.values.insert(field.to_string(), value.into());
        self
    }

    pub fn with_error(mut self, field: &str, message: impl Into<String>) -> Self {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
        self
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDto {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorDto {
    pub id: Uuid,
    pub username: String,
}

/// A post as shown in listings and on its own page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCard {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: String,
    pub group: Option<GroupDto>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDto {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub created: DateTime<Utc>,
}

/// One page of a feed with its navigation data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDto<T> {
    pub object_list: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u64>,
    pub previous_page_number: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexContext {
    pub page_obj: PageDto<PostCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupContext {
    pub group: GroupDto,
    pub page_obj: PageDto<PostCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileContext {
    pub author: AuthorDto,
    pub post_count: u64,
    /// Whether the viewing user follows `author`.
    pub following: bool,
    pub page_obj: PageDto<PostCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailContext {
    pub post: PostCard,
    pub author_post_count: u64,
    pub comments: Vec<CommentDto>,
    pub form: FormState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormContext {
    pub form: FormState,
    pub groups: Vec<GroupDto>,
    pub is_edit: bool,
    pub post_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthFormContext {
    pub form: FormState,
    pub next: Option<String>,
}
