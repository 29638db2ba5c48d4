use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FieldErrors;

/// Longest username accepted at signup.
pub const USERNAME_MAX_LEN: usize = 150;

/// User entity - an account that can author posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and join timestamp.
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            date_joined: Utc::now(),
        }
    }

    /// Check a username against the signup rules.
    ///
    /// Letters, digits and `@.+-_` only, at most [`USERNAME_MAX_LEN`] characters.
    pub fn validate_username(username: &str) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if username.is_empty() {
            errors.add("username", "This field is required.");
        } else if username.chars().count() > USERNAME_MAX_LEN {
            errors.add(
                "username",
                format!("Ensure this value has at most {USERNAME_MAX_LEN} characters."),
            );
        } else if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        errors.into_result()
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}
