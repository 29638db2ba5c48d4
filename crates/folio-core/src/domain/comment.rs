use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FieldErrors;
use super::validation::preview;

/// Comment entity - a reply left on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: Uuid,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(preview(&self.text, 15))
    }
}

/// A comment that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: Uuid,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl NewComment {
    /// Validate the submitted text and stamp the comment with the current time.
    pub fn new(post_id: i64, author_id: Uuid, text: &str) -> Result<Self, FieldErrors> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FieldErrors::single("text", "This field is required."));
        }

        Ok(Self {
            post_id,
            author_id,
            text: text.to_string(),
            created: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_comment_rejects_blank_text() {
        assert!(NewComment::new(1, Uuid::new_v4(), " \t").is_err());

        let comment = NewComment::new(1, Uuid::new_v4(), " Тестовый комментарий ").unwrap();
        assert_eq!(comment.text, "Тестовый комментарий");
    }
}
