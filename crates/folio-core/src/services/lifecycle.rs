//! Referential-integrity hooks.
//!
//! Removing a user, group or post goes through here so dependents are handled
//! the same way on every store: posts and comments cascade with their owner,
//! posts outlive their group with the reference cleared.

use uuid::Uuid;

use super::Repositories;
use crate::domain::{Group, NewGroup};
use crate::error::{DomainError, RepoError};

pub struct LifecycleService {
    repos: Repositories,
}

impl LifecycleService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn create_group(&self, group: NewGroup) -> Result<Group, DomainError> {
        group.validate()?;
        match self.repos.groups.create(group).await {
            Ok(group) => {
                tracing::info!(group_id = group.id, slug = %group.slug, "Group created");
                Ok(group)
            }
            Err(RepoError::Constraint(msg)) => Err(DomainError::Duplicate(msg)),
            Err(e) => Err(e.into()),
        }
    }

    /// Set-null: the group's posts survive with no group.
    pub async fn delete_group(&self, group_id: i64) -> Result<u64, DomainError> {
        if self.repos.groups.find_by_id(group_id).await?.is_none() {
            return Err(DomainError::not_found("group", group_id));
        }

        let cleared = self.repos.posts.clear_group(group_id).await?;
        self.repos.groups.delete(group_id).await?;

        tracing::info!(group_id, cleared, "Group deleted");
        Ok(cleared)
    }

    /// Cascade: the post's comments go with it.
    pub async fn delete_post(&self, post_id: i64) -> Result<(), DomainError> {
        if self.repos.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::not_found("post", post_id));
        }

        let comments = self.repos.comments.delete_for_posts(&[post_id]).await?;
        self.repos.posts.delete(post_id).await?;

        tracing::info!(post_id, comments, "Post deleted");
        Ok(())
    }

    /// Cascade: posts, comments on those posts, the user's own comments and
    /// every follow edge touching the user.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), DomainError> {
        if self.repos.users.find_by_id(user_id).await?.is_none() {
            return Err(DomainError::not_found("user", user_id));
        }

        let post_ids = self.repos.posts.ids_by_author(user_id).await?;
        let mut comments = self.repos.comments.delete_for_posts(&post_ids).await?;
        comments += self.repos.comments.delete_by_author(user_id).await?;
        let posts = self.repos.posts.delete_by_author(user_id).await?;
        let follows = self.repos.follows.delete_involving(user_id).await?;
        self.repos.users.delete(user_id).await?;

        tracing::info!(%user_id, posts, comments, follows, "User deleted");
        Ok(())
    }
}
