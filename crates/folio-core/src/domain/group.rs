use std::fmt;

use serde::{Deserialize, Serialize};

use super::FieldErrors;

/// Maximum length of a group title and slug.
pub const GROUP_FIELD_MAX_LEN: usize = 200;

/// Group entity - a topical community posts may belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// A group that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl NewGroup {
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            description: description.into(),
        }
    }

    /// Uniqueness is left to the store; this only checks shape.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.title.trim().is_empty() {
            errors.add("title", "This field is required.");
        } else if self.title.chars().count() > GROUP_FIELD_MAX_LEN {
            errors.add("title", "Ensure this value has at most 200 characters.");
        }

        if self.slug.is_empty() {
            errors.add("slug", "This field is required.");
        } else if self.slug.len() > GROUP_FIELD_MAX_LEN {
            errors.add("slug", "Ensure this value has at most 200 characters.");
        } else if !is_slug(&self.slug) {
            errors.add(
                "slug",
                "Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens.",
            );
        }

        errors.into_result()
    }
}

/// `[-a-zA-Z0-9_]+`
pub fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
