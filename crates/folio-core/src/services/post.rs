use std::sync::Arc;

use uuid::Uuid;

use super::Repositories;
use super::entries::{CommentEntry, EntryResolver, PostEntry};
use crate::domain::{
    Comment, FieldErrors, Group, INVALID_IMAGE, NewComment, NewPost, Post, PostContent,
    PostDraft, PostScope,
};
use crate::error::DomainError;
use crate::policy;
use crate::ports::ImageStore;

pub const INVALID_GROUP: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Result of asking to edit a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAccess {
    /// The actor is the author. Carries the current (or just saved) post.
    Granted(Post),
    /// The actor is not the author; nothing was changed.
    Denied,
}

/// Everything the detail view shows.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub entry: PostEntry,
    pub author_post_count: u64,
    pub comments: Vec<CommentEntry>,
}

/// Post authoring and commenting.
pub struct PostService {
    repos: Repositories,
    images: Arc<dyn ImageStore>,
}

impl PostService {
    pub fn new(repos: Repositories, images: Arc<dyn ImageStore>) -> Self {
        Self { repos, images }
    }

    /// Publish a post written by `actor`.
    pub async fn create(&self, actor: Uuid, draft: &PostDraft) -> Result<Post, DomainError> {
        let content = self.prepare(draft).await?;
        let post = self.repos.posts.create(NewPost::new(actor, content)).await?;

        tracing::info!(post_id = post.id, author_id = %actor, "Post created");
        Ok(post)
    }

    /// Whether `actor` may open the edit form for `post_id`.
    pub async fn editable(&self, actor: Uuid, post_id: i64) -> Result<EditAccess, DomainError> {
        let post = self.find(post_id).await?;
        if policy::can_edit(actor, &post) {
            Ok(EditAccess::Granted(post))
        } else {
            Ok(EditAccess::Denied)
        }
    }

    /// Apply an edit. Non-authors get `Denied` before the draft is even looked at.
    pub async fn edit(
        &self,
        actor: Uuid,
        post_id: i64,
        draft: &PostDraft,
    ) -> Result<EditAccess, DomainError> {
        let mut post = self.find(post_id).await?;
        if !policy::can_edit(actor, &post) {
            tracing::debug!(post_id, actor = %actor, "Edit refused: not the author");
            return Ok(EditAccess::Denied);
        }

        let content = self.prepare(draft).await?;
        post.apply(content);
        let post = self.repos.posts.update(post).await?;

        tracing::info!(post_id, "Post updated");
        Ok(EditAccess::Granted(post))
    }

    pub async fn detail(&self, post_id: i64) -> Result<PostDetail, DomainError> {
        let post = self.find(post_id).await?;
        let author_post_count = self
            .repos
            .posts
            .count(PostScope::Author(post.author_id))
            .await?;
        let comments = self.repos.comments.list_for_post(post_id).await?;

        let mut resolver = EntryResolver::new(&self.repos);
        let entry = resolver.post(post).await?;
        let comments = resolver.comments(comments).await?;

        Ok(PostDetail {
            entry,
            author_post_count,
            comments,
        })
    }

    /// Attach a comment by `actor` to `post_id`.
    pub async fn add_comment(
        &self,
        actor: Uuid,
        post_id: i64,
        text: &str,
    ) -> Result<Comment, DomainError> {
        self.find(post_id).await?;
        let comment = NewComment::new(post_id, actor, text)?;
        let comment = self.repos.comments.create(comment).await?;

        tracing::info!(post_id, comment_id = comment.id, "Comment added");
        Ok(comment)
    }

    /// Groups a post may be filed under.
    pub async fn group_choices(&self) -> Result<Vec<Group>, DomainError> {
        Ok(self.repos.groups.list().await?)
    }

    async fn find(&self, post_id: i64) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    /// Validate the draft, then store its image. Nothing is written for an
    /// invalid draft.
    async fn prepare(&self, draft: &PostDraft) -> Result<PostContent, DomainError> {
        let mut content = self.validate(draft).await?;

        if let (Some(upload), Some(path)) = (&draft.image, content.image.as_mut()) {
            let stored = self
                .images
                .save(path.as_str(), &upload.content)
                .await
                .map_err(|e| DomainError::Internal(e.to_string()))?;
            *path = stored;
            tracing::debug!(path = %path, bytes = upload.content.len(), "Post image stored");
        }
        Ok(content)
    }

    /// Field checks plus "the chosen group exists" and "the image decodes",
    /// reported together.
    async fn validate(&self, draft: &PostDraft) -> Result<PostContent, DomainError> {
        let (content, mut errors) = match draft.validate() {
            Ok(content) => (Some(content), FieldErrors::new()),
            Err(errors) => (None, errors),
        };

        if let Some(group_id) = draft.group_id {
            if self.repos.groups.find_by_id(group_id).await?.is_none() {
                errors.add("group", INVALID_GROUP);
            }
        }

        if let Some(upload) = &draft.image {
            if errors.get("image").is_none() && !self.images.is_image(&upload.content) {
                errors.add("image", INVALID_IMAGE);
            }
        }

        match content {
            Some(content) if errors.is_empty() => Ok(content),
            _ => Err(DomainError::Validation(errors)),
        }
    }
}
