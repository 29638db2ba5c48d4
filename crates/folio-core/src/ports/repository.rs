use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Comment, Follow, Group, NewComment, NewGroup, NewPost, Post, PostScope, User,
};
use crate::error::RepoError;

/// Lookup and removal by primary key, shared by every repository.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Delete an entity by its ID. `RepoError::NotFound` if nothing matched.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Insert a user. A taken username is a `RepoError::Constraint`.
    async fn create(&self, user: User) -> Result<User, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Group repository.
#[async_trait]
pub trait GroupRepository: BaseRepository<Group, i64> {
    /// Insert a group. A taken title or slug is a `RepoError::Constraint`.
    async fn create(&self, group: NewGroup) -> Result<Group, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;

    /// All groups ordered by title.
    async fn list(&self) -> Result<Vec<Group>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i64> {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    /// Persist text, group and image of an existing post.
    /// Author and publication date are never written.
    async fn update(&self, post: Post) -> Result<Post, RepoError>;

    async fn count(&self, scope: PostScope) -> Result<u64, RepoError>;

    /// Posts in scope, newest first. Equal timestamps: later insert first.
    async fn list(&self, scope: PostScope, offset: u64, limit: u64)
    -> Result<Vec<Post>, RepoError>;

    async fn ids_by_author(&self, author_id: Uuid) -> Result<Vec<i64>, RepoError>;

    /// Set-null hook for group removal. Returns the number of posts touched.
    async fn clear_group(&self, group_id: i64) -> Result<u64, RepoError>;

    async fn delete_by_author(&self, author_id: Uuid) -> Result<u64, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, i64> {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError>;

    /// Comments on a post, oldest first.
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, RepoError>;

    async fn delete_for_posts(&self, post_ids: &[i64]) -> Result<u64, RepoError>;

    async fn delete_by_author(&self, author_id: Uuid) -> Result<u64, RepoError>;
}

/// Follow edge repository.
#[async_trait]
pub trait FollowRepository: BaseRepository<Follow, i64> {
    /// Insert an edge. An existing pair is a `RepoError::Constraint`.
    async fn create(&self, user_id: Uuid, author_id: Uuid) -> Result<Follow, RepoError>;

    async fn find_pair(&self, user_id: Uuid, author_id: Uuid)
    -> Result<Option<Follow>, RepoError>;

    /// Returns whether an edge was removed.
    async fn delete_pair(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    /// Number of authors `user_id` follows.
    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, RepoError>;

    /// Remove every edge where the user is follower or author.
    async fn delete_involving(&self, user_id: Uuid) -> Result<u64, RepoError>;
}
