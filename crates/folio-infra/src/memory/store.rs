//! In-memory entity store - used when no database is configured and in tests.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use folio_core::domain::{
    Comment, Follow, Group, NewComment, NewGroup, NewPost, Post, PostScope, User,
};
use folio_core::error::RepoError;
use folio_core::ports::{
    BaseRepository, CommentRepository, FollowRepository, GroupRepository, PostRepository,
    UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    follows: BTreeMap<i64, Follow>,
    sequences: Sequences,
}

/// Per-table serial ids, starting at 1 like a database sequence.
#[derive(Default)]
struct Sequences {
    groups: i64,
    posts: i64,
    comments: i64,
    follows: i64,
}

fn next_id(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

fn in_scope(post: &Post, scope: PostScope, followed: &HashSet<Uuid>) -> bool {
    match scope {
        PostScope::All => true,
        PostScope::Group(group_id) => post.group_id == Some(group_id),
        PostScope::Author(author_id) => post.author_id == author_id,
        PostScope::FollowedBy(_) => followed.contains(&post.author_id),
    }
}

impl Tables {
    /// The group reference of a post must name an existing group.
    fn check_group(&self, group_id: Option<i64>) -> Result<(), RepoError> {
        match group_id {
            Some(id) if !self.groups.contains_key(&id) => {
                Err(RepoError::Constraint("post group does not exist".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn check_user(&self, user_id: Uuid, role: &str) -> Result<(), RepoError> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(RepoError::Constraint(format!("{role} does not exist")))
        }
    }

    fn followed_by(&self, scope: PostScope) -> HashSet<Uuid> {
        match scope {
            PostScope::FollowedBy(user_id) => self
                .follows
                .values()
                .filter(|f| f.user_id == user_id)
                .map(|f| f.author_id)
                .collect(),
            _ => HashSet::new(),
        }
    }
}

/// Every repository port over a single lock-protected set of tables.
///
/// Uniqueness, reference and self-follow rules match the relational schema,
/// and violations surface as `RepoError::Constraint`. Cascades are not automatic
/// here; they run through the lifecycle hooks in `folio-core`.
/// Note: Data is lost on process restart.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.tables
            .write()
            .await
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(RepoError::Constraint(format!(
                "username '{}' is taken",
                user.username
            )));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl BaseRepository<Group, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, RepoError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.tables
            .write()
            .await
            .groups
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn create(&self, group: NewGroup) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .groups
            .values()
            .any(|g| g.title == group.title || g.slug == group.slug)
        {
            return Err(RepoError::Constraint(format!(
                "group '{}' ({}) already exists",
                group.title, group.slug
            )));
        }

        let group = Group {
            id: next_id(&mut tables.sequences.groups),
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .groups
            .values()
            .find(|g| g.slug == slug)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Group>, RepoError> {
        let mut groups: Vec<Group> = self.tables.read().await.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }
}

#[async_trait]
impl BaseRepository<Post, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.tables
            .write()
            .await
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.check_user(post.author_id, "post author")?;
        tables.check_group(post.content.group_id)?;

        let post = Post {
            id: next_id(&mut tables.sequences.posts),
            text: post.content.text,
            pub_date: post.pub_date,
            author_id: post.author_id,
            group_id: post.content.group_id,
            image: post.content.image,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.check_group(post.group_id)?;
        let stored = tables.posts.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        stored.text = post.text;
        stored.group_id = post.group_id;
        stored.image = post.image;
        Ok(stored.clone())
    }

    async fn count(&self, scope: PostScope) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        let followed = tables.followed_by(scope);
        Ok(tables
            .posts
            .values()
            .filter(|p| in_scope(p, scope, &followed))
            .count() as u64)
    }

    async fn list(
        &self,
        scope: PostScope,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        let followed = tables.followed_by(scope);

        let mut posts: Vec<&Post> = tables
            .posts
            .values()
            .filter(|p| in_scope(p, scope, &followed))
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));

        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn ids_by_author(&self, author_id: Uuid) -> Result<Vec<i64>, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .posts
            .values()
            .filter(|p| p.author_id == author_id)
            .map(|p| p.id)
            .collect())
    }

    async fn clear_group(&self, group_id: i64) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        let mut cleared = 0;
        for post in tables.posts.values_mut() {
            if post.group_id == Some(group_id) {
                post.group_id = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn delete_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|_, p| p.author_id != author_id);
        Ok((before - tables.posts.len()) as u64)
    }
}

#[async_trait]
impl BaseRepository<Comment, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.tables
            .write()
            .await
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint("comment post does not exist".to_string()));
        }
        tables.check_user(comment.author_id, "comment author")?;

        let comment = Comment {
            id: next_id(&mut tables.sequences.comments),
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created: comment.created,
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn delete_for_posts(&self, post_ids: &[i64]) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|_, c| !post_ids.contains(&c.post_id));
        Ok((before - tables.comments.len()) as u64)
    }

    async fn delete_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|_, c| c.author_id != author_id);
        Ok((before - tables.comments.len()) as u64)
    }
}

#[async_trait]
impl BaseRepository<Follow, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Follow>, RepoError> {
        Ok(self.tables.read().await.follows.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.tables
            .write()
            .await
            .follows
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl FollowRepository for InMemoryStore {
    async fn create(&self, user_id: Uuid, author_id: Uuid) -> Result<Follow, RepoError> {
        let mut tables = self.tables.write().await;
        if user_id == author_id {
            return Err(RepoError::Constraint("follow_not_self".to_string()));
        }
        tables.check_user(user_id, "follower")?;
        tables.check_user(author_id, "followed author")?;
        if tables
            .follows
            .values()
            .any(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Err(RepoError::Constraint("unique_follow".to_string()));
        }

        let follow = Follow {
            id: next_id(&mut tables.sequences.follows),
            user_id,
            author_id,
        };
        tables.follows.insert(follow.id, follow.clone());
        Ok(follow)
    }

    async fn find_pair(
        &self,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<Option<Follow>, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .follows
            .values()
            .find(|f| f.user_id == user_id && f.author_id == author_id)
            .cloned())
    }

    async fn delete_pair(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|_, f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(tables.follows.len() < before)
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .follows
            .values()
            .filter(|f| f.user_id == user_id)
            .count() as u64)
    }

    async fn delete_involving(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|_, f| f.user_id != user_id && f.author_id != user_id);
        Ok((before - tables.follows.len()) as u64)
    }
}
