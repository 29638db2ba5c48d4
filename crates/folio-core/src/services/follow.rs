use uuid::Uuid;

use super::Repositories;
use crate::domain::User;
use crate::error::{DomainError, RepoError};
use crate::policy;

/// What a follow or unfollow request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    Unfollowed,
    NotFollowing,
    /// Target is the actor; nothing was written.
    SelfFollowRejected,
}

/// Follow edge management. Both directions are idempotent.
pub struct FollowService {
    repos: Repositories,
}

impl FollowService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn follow(&self, actor: Uuid, username: &str) -> Result<FollowOutcome, DomainError> {
        let author = self.author(username).await?;
        if !policy::can_follow(actor, author.id) {
            return Ok(FollowOutcome::SelfFollowRejected);
        }

        if self.repos.follows.find_pair(actor, author.id).await?.is_some() {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        match self.repos.follows.create(actor, author.id).await {
            Ok(_) => {
                tracing::info!(user_id = %actor, author = %author.username, "Followed author");
                Ok(FollowOutcome::Followed)
            }
            // Lost a race with a concurrent follow of the same pair.
            Err(RepoError::Constraint(_)) => Ok(FollowOutcome::AlreadyFollowing),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn unfollow(
        &self,
        actor: Uuid,
        username: &str,
    ) -> Result<FollowOutcome, DomainError> {
        let author = self.author(username).await?;
        if !policy::can_follow(actor, author.id) {
            return Ok(FollowOutcome::SelfFollowRejected);
        }

        if self.repos.follows.delete_pair(actor, author.id).await? {
            tracing::info!(user_id = %actor, author = %author.username, "Unfollowed author");
            Ok(FollowOutcome::Unfollowed)
        } else {
            Ok(FollowOutcome::NotFollowing)
        }
    }

    async fn author(&self, username: &str) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))
    }
}
