//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, Value,
};
use uuid::Uuid;

use folio_core::domain::{
    Comment, Follow, Group, NewComment, NewGroup, NewPost, Post, PostScope, User,
};
use folio_core::error::RepoError;
use folio_core::ports::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};

use super::entity::{comment, follow, group, post, user};
use super::postgres_base::{PostgresBaseRepository, query_error, write_error};

pub type PostgresUserRepository = PostgresBaseRepository<user::Entity>;
pub type PostgresGroupRepository = PostgresBaseRepository<group::Entity>;
pub type PostgresPostRepository = PostgresBaseRepository<post::Entity>;
pub type PostgresCommentRepository = PostgresBaseRepository<comment::Entity>;
pub type PostgresFollowRepository = PostgresBaseRepository<follow::Entity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, RepoError> {
        let model = user::ActiveModel::from(user)
            .insert(&self.db)
            .await
            .map_err(write_error)?;
        Ok(model.into())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_error)?;
        Ok(model.map(Into::into))
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn create(&self, group: NewGroup) -> Result<Group, RepoError> {
        let model = group::ActiveModel::from(group)
            .insert(&self.db)
            .await
            .map_err(write_error)?;
        Ok(model.into())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let model = group::Entity::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(query_error)?;
        Ok(model.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<Group>, RepoError> {
        let models = group::Entity::find()
            .order_by_asc(group::Column::Title)
            .all(&self.db)
            .await
            .map_err(query_error)?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}

/// Row filter selecting the posts of a feed.
fn scope_condition(scope: PostScope) -> Condition {
    let condition = Condition::all();
    match scope {
        PostScope::All => condition,
        PostScope::Group(group_id) => condition.add(post::Column::GroupId.eq(group_id)),
        PostScope::Author(author_id) => condition.add(post::Column::AuthorId.eq(author_id)),
        PostScope::FollowedBy(user_id) => condition.add(
            post::Column::AuthorId.in_subquery(
                Query::select()
                    .column(follow::Column::AuthorId)
                    .from(follow::Entity)
                    .and_where(follow::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        ),
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError> {
        let model = post::ActiveModel::from(post)
            .insert(&self.db)
            .await
            .map_err(write_error)?;
        Ok(model.into())
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let active = post::ActiveModel {
            id: ActiveValue::Unchanged(post.id),
            text: Set(post.text),
            group_id: Set(post.group_id),
            image: Set(post.image),
            ..Default::default()
        };
        let model = active.update(&self.db).await.map_err(write_error)?;
        Ok(model.into())
    }

    async fn count(&self, scope: PostScope) -> Result<u64, RepoError> {
        post::Entity::find()
            .filter(scope_condition(scope))
            .count(&self.db)
            .await
            .map_err(query_error)
    }

    async fn list(
        &self,
        scope: PostScope,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        tracing::debug!(?scope, offset, limit, "Listing posts");

        let models = post::Entity::find()
            .filter(scope_condition(scope))
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(query_error)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn ids_by_author(&self, author_id: Uuid) -> Result<Vec<i64>, RepoError> {
        post::Entity::find()
            .select_only()
            .column(post::Column::Id)
            .filter(post::Column::AuthorId.eq(author_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(query_error)
    }

    async fn clear_group(&self, group_id: i64) -> Result<u64, RepoError> {
        let result = post::Entity::update_many()
            .col_expr(post::Column::GroupId, Expr::value(Value::BigInt(None)))
            .filter(post::Column::GroupId.eq(group_id))
            .exec(&self.db)
            .await
            .map_err(write_error)?;
        Ok(result.rows_affected)
    }

    async fn delete_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let result = post::Entity::delete_many()
            .filter(post::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await
            .map_err(write_error)?;
        Ok(result.rows_affected)
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let model = comment::ActiveModel::from(comment)
            .insert(&self.db)
            .await
            .map_err(write_error)?;
        Ok(model.into())
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, RepoError> {
        let models = comment::Entity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::Created)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(query_error)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn delete_for_posts(&self, post_ids: &[i64]) -> Result<u64, RepoError> {
        if post_ids.is_empty() {
            return Ok(0);
        }
        let result = comment::Entity::delete_many()
            .filter(comment::Column::PostId.is_in(post_ids.iter().copied()))
            .exec(&self.db)
            .await
            .map_err(write_error)?;
        Ok(result.rows_affected)
    }

    async fn delete_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let result = comment::Entity::delete_many()
            .filter(comment::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await
            .map_err(write_error)?;
        Ok(result.rows_affected)
    }
}

fn pair(user_id: Uuid, author_id: Uuid) -> Condition {
    Condition::all()
        .add(follow::Column::UserId.eq(user_id))
        .add(follow::Column::AuthorId.eq(author_id))
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn create(&self, user_id: Uuid, author_id: Uuid) -> Result<Follow, RepoError> {
        let active = follow::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
            ..Default::default()
        };
        let model = active.insert(&self.db).await.map_err(write_error)?;
        Ok(model.into())
    }

    async fn find_pair(
        &self,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<Option<Follow>, RepoError> {
        let model = follow::Entity::find()
            .filter(pair(user_id, author_id))
            .one(&self.db)
            .await
            .map_err(query_error)?;
        Ok(model.map(Into::into))
    }

    async fn delete_pair(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let result = follow::Entity::delete_many()
            .filter(pair(user_id, author_id))
            .exec(&self.db)
            .await
            .map_err(write_error)?;
        Ok(result.rows_affected > 0)
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, RepoError> {
        follow::Entity::find()
            .filter(follow::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
            .map_err(query_error)
    }

    async fn delete_involving(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let result = follow::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(follow::Column::UserId.eq(user_id))
                    .add(follow::Column::AuthorId.eq(user_id)),
            )
            .exec(&self.db)
            .await
            .map_err(write_error)?;
        Ok(result.rows_affected)
    }
}
