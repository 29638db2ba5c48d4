//! Use-case services composed from the ports.
//!
//! Each service owns a [`Repositories`] handle and is cheap to clone behind an
//! `Arc`. Nothing here knows about HTTP; callers translate outcomes into
//! responses.

mod account;
mod entries;
mod feed;
mod follow;
mod lifecycle;
mod post;

use std::sync::Arc;

use crate::ports::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};

pub use account::{AccountService, MIN_PASSWORD_LEN, Session};
pub use entries::{CommentEntry, PostEntry};
pub use feed::{FeedConfig, FeedService, GroupFeed, ProfileFeed};
pub use follow::{FollowOutcome, FollowService};
pub use lifecycle::LifecycleService;
pub use post::{EditAccess, INVALID_GROUP, PostDetail, PostService};

/// Handles to every entity store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
}

impl Repositories {
    /// Use one store that implements every repository.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + GroupRepository
            + PostRepository
            + CommentRepository
            + FollowRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            groups: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            follows: store,
        }
    }
}
