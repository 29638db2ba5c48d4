use std::time::Duration;

use uuid::Uuid;

use super::Repositories;
use super::entries::{EntryResolver, PostEntry};
use crate::domain::{Group, PostScope, User};
use crate::error::DomainError;
use crate::pagination::{Page, Paginator};

/// Settings shared by every feed and the index page cache.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Posts per page, the same for all four feeds.
    pub page_size: u64,
    /// How long a rendered global feed page is served from cache.
    pub index_cache_ttl: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            index_cache_ttl: Duration::from_secs(20),
        }
    }
}

/// Group feed with the resolved group.
#[derive(Debug, Clone)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<PostEntry>,
}

/// Profile feed with the resolved author.
#[derive(Debug, Clone)]
pub struct ProfileFeed {
    pub author: User,
    pub post_count: u64,
    /// Whether the viewing user follows this author.
    pub following: bool,
    pub page: Page<PostEntry>,
}

/// Builds the paginated post feeds.
pub struct FeedService {
    repos: Repositories,
    config: FeedConfig,
}

impl FeedService {
    pub fn new(repos: Repositories, config: FeedConfig) -> Self {
        Self { repos, config }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Every post.
    pub async fn global(&self, page: Option<&str>) -> Result<Page<PostEntry>, DomainError> {
        self.paginate(PostScope::All, page).await
    }

    /// Posts of the group with `slug`.
    pub async fn group(&self, slug: &str, page: Option<&str>) -> Result<GroupFeed, DomainError> {
        let group = self
            .repos
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("group", slug))?;

        let page = self.paginate(PostScope::Group(group.id), page).await?;
        Ok(GroupFeed { group, page })
    }

    /// Posts written by `username`, plus whether `viewer` follows them.
    pub async fn profile(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        page: Option<&str>,
    ) -> Result<ProfileFeed, DomainError> {
        let author = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let following = match viewer {
            Some(viewer) => self
                .repos
                .follows
                .find_pair(viewer, author.id)
                .await?
                .is_some(),
            None => false,
        };

        let page = self.paginate(PostScope::Author(author.id), page).await?;
        Ok(ProfileFeed {
            post_count: page.count,
            author,
            following,
            page,
        })
    }

    /// Posts by every author `user_id` follows.
    pub async fn following(
        &self,
        user_id: Uuid,
        page: Option<&str>,
    ) -> Result<Page<PostEntry>, DomainError> {
        self.paginate(PostScope::FollowedBy(user_id), page).await
    }

    async fn paginate(
        &self,
        scope: PostScope,
        page: Option<&str>,
    ) -> Result<Page<PostEntry>, DomainError> {
        let count = self.repos.posts.count(scope).await?;
        let paginator = Paginator::new(count, self.config.page_size);
        let number = paginator.page_number(page);

        let posts = self
            .repos
            .posts
            .list(scope, paginator.offset(number), paginator.per_page())
            .await?;
        tracing::debug!(?scope, count, page = number, "Composed feed page");

        let entries = EntryResolver::new(&self.repos).posts(posts).await?;
        Ok(paginator.page(number, entries))
    }
}
