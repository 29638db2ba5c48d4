use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
use uuid::Uuid;

use folio_core::domain::{Group, NewGroup, Post, PostScope};
use folio_core::error::RepoError;
use folio_core::ports::{
    BaseRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};

use super::entity::{group, post, user};
use super::postgres_repo::{
    PostgresFollowRepository, PostgresGroupRepository, PostgresPostRepository,
    PostgresUserRepository,
};

fn post_model(id: i64, author_id: Uuid, text: &str) -> post::Model {
    post::Model {
        id,
        text: text.to_owned(),
        pub_date: Utc::now().into(),
        author_id,
        group_id: None,
        image: Some("posts/small.gif".to_owned()),
    }
}

fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
}

#[tokio::test]
async fn test_find_post_by_id() {
    let author_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(1, author_id, "Тестовый текст")]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let found: Option<Post> = repo.find_by_id(1).await.unwrap();

    let post = found.unwrap();
    assert_eq!(post.id, 1);
    assert_eq!(post.text, "Тестовый текст");
    assert_eq!(post.author_id, author_id);
    assert_eq!(post.image.as_deref(), Some("posts/small.gif"));
}

#[tokio::test]
async fn test_list_posts_maps_rows_in_order() {
    let author_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![
            post_model(2, author_id, "newer"),
            post_model(1, author_id, "older"),
        ]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let posts = repo.list(PostScope::Author(author_id), 0, 10).await.unwrap();

    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, [2, 1]);
}

#[tokio::test]
async fn test_count_following_scope() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[count_row(3)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let count = repo.count(PostScope::FollowedBy(Uuid::new_v4())).await.unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_clear_group_reports_rows() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 4,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    assert_eq!(repo.clear_group(7).await.unwrap(), 4);
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result = BaseRepository::<Post, i64>::delete(&repo, 99).await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_create_group_returns_stored_row() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![group::Model {
            id: 1,
            title: "Тестовая группа".to_owned(),
            slug: "test-slug".to_owned(),
            description: "Тестовое описание".to_owned(),
        }]])
        .into_connection();

    let repo = PostgresGroupRepository::new(db);
    let group: Group = repo
        .create(NewGroup::new("Тестовая группа", "test-slug", "Тестовое описание"))
        .await
        .unwrap();

    assert_eq!(group.id, 1);
    assert_eq!(group.slug, "test-slug");
    assert_eq!(group.to_string(), "Тестовая группа");
}

#[tokio::test]
async fn test_find_user_by_username() {
    let id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user::Model {
            id,
            username: "Andrey".to_owned(),
            password_hash: "hash".to_owned(),
            date_joined: Utc::now().into(),
        }]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let user = repo.find_by_username("Andrey").await.unwrap().unwrap();
    assert_eq!(user.id, id);
}

#[tokio::test]
async fn test_delete_pair_reports_removal() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ])
        .into_connection();

    let repo = PostgresFollowRepository::new(db);
    let (user_id, author_id) = (Uuid::new_v4(), Uuid::new_v4());
    assert!(repo.delete_pair(user_id, author_id).await.unwrap());
    assert!(!repo.delete_pair(user_id, author_id).await.unwrap());
}
