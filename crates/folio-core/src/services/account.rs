use std::sync::Arc;

use crate::domain::{FieldErrors, User};
use crate::error::{DomainError, RepoError};
use crate::ports::{PasswordService, TokenService, UserRepository};

pub const MIN_PASSWORD_LEN: usize = 8;

const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// A signed-in user and their session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Signup and login.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
        }
    }

    pub async fn signup(&self, username: &str, password: &str) -> Result<Session, DomainError> {
        let mut errors = match User::validate_username(username) {
            Ok(()) => FieldErrors::new(),
            Err(errors) => errors,
        };
        if password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!(
                    "This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."
                ),
            );
        }
        errors.into_result()?;

        if self.users.find_by_username(username).await?.is_some() {
            return Err(FieldErrors::single("username", USERNAME_TAKEN).into());
        }

        let password_hash = self
            .passwords
            .hash(password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let user = match self
            .users
            .create(User::new(username.to_string(), password_hash))
            .await
        {
            Ok(user) => user,
            Err(RepoError::Constraint(_)) => {
                return Err(FieldErrors::single("username", USERNAME_TAKEN).into());
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(user_id = %user.id, "User signed up");
        self.session(user)
    }

    /// Unknown user and wrong password both read as `Unauthorized`.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, DomainError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = self
            .passwords
            .verify(password, &user.password_hash)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if !valid {
            tracing::debug!(user_id = %user.id, "Login refused: bad password");
            return Err(DomainError::Unauthorized);
        }

        self.session(user)
    }

    /// The account behind a session token. A token that fails validation,
    /// or whose user has since been deleted, yields `None`.
    pub async fn session_user(&self, token: &str) -> Result<Option<User>, DomainError> {
        let claims = match self.tokens.validate_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Session token rejected");
                return Ok(None);
            }
        };

        let user = self.users.find_by_id(claims.user_id).await?;
        if user.is_none() {
            tracing::debug!(user_id = %claims.user_id, "Session refers to a deleted account");
        }
        Ok(user)
    }

    fn session(&self, user: User) -> Result<Session, DomainError> {
        let token = self
            .tokens
            .generate_token(user.id, &user.username)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(Session { user, token })
    }
}
