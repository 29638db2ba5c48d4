use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::Repositories;
use crate::domain::{Comment, Group, Post};
use crate::error::DomainError;

/// A post together with what a listing shows next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostEntry {
    pub post: Post,
    pub author: String,
    pub group: Option<Group>,
}

/// A comment with its author's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentEntry {
    pub comment: Comment,
    pub author: String,
}

/// Resolves authors and groups once per distinct id.
pub(crate) struct EntryResolver<'a> {
    repos: &'a Repositories,
    authors: HashMap<Uuid, String>,
    groups: HashMap<i64, Option<Group>>,
}

impl<'a> EntryResolver<'a> {
    pub(crate) fn new(repos: &'a Repositories) -> Self {
        Self {
            repos,
            authors: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    pub(crate) async fn author(&mut self, id: Uuid) -> Result<String, DomainError> {
        if let Some(name) = self.authors.get(&id) {
            return Ok(name.clone());
        }
        let user = self
            .repos
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("author {id} is missing")))?;
        self.authors.insert(id, user.username.clone());
        Ok(user.username)
    }

    async fn group(&mut self, id: Option<i64>) -> Result<Option<Group>, DomainError> {
        let Some(id) = id else {
            return Ok(None);
        };
        if let Some(group) = self.groups.get(&id) {
            return Ok(group.clone());
        }
        // A concurrently removed group reads as "no group", like the set-null hook.
        let group = self.repos.groups.find_by_id(id).await?;
        self.groups.insert(id, group.clone());
        Ok(group)
    }

    pub(crate) async fn post(&mut self, post: Post) -> Result<PostEntry, DomainError> {
        let author = self.author(post.author_id).await?;
        let group = self.group(post.group_id).await?;
        Ok(PostEntry {
            post,
            author,
            group,
        })
    }

    pub(crate) async fn posts(&mut self, posts: Vec<Post>) -> Result<Vec<PostEntry>, DomainError> {
        let mut entries = Vec::with_capacity(posts.len());
        for post in posts {
            entries.push(self.post(post).await?);
        }
        Ok(entries)
    }

    pub(crate) async fn comments(
        &mut self,
        comments: Vec<Comment>,
    ) -> Result<Vec<CommentEntry>, DomainError> {
        let mut entries = Vec::with_capacity(comments.len());
        for comment in comments {
            let author = self.author(comment.author_id).await?;
            entries.push(CommentEntry { comment, author });
        }
        Ok(entries)
    }
}
