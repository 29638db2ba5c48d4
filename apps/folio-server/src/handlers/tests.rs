//! HTTP scenarios against the in-memory store.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::Value;

use folio_core::domain::{NewGroup, PostDraft, PostScope};
use folio_core::services::{FeedConfig, LifecycleService, Repositories, Session};
use folio_infra::{
    Argon2PasswordService, InMemoryCache, InMemoryImageStore, InMemoryStore, JwtConfig,
    JwtTokenService,
};

use super::{INDEX_CACHE_PREFIX, configure_routes};
use crate::middleware::auth::SESSION_COOKIE;
use crate::middleware::page_cache::CACHE_STATUS_HEADER;
use crate::state::AppState;

/// A 2x1 GIF.
const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
    0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

const BOUNDARY: &str = "folio-test-boundary";

struct Fixture {
    state: AppState,
    repos: Repositories,
    images: Arc<InMemoryImageStore>,
    lifecycle: LifecycleService,
    author: Session,
    group_id: i64,
    post_id: i64,
}

/// "Andrey" with one post "Тестовый текст" in group `test-slug`.
async fn fixture() -> Fixture {
    let repos = Repositories::from_store(Arc::new(InMemoryStore::new()));
    let images = Arc::new(InMemoryImageStore::new());
    let state = AppState::from_parts(
        repos.clone(),
        Arc::new(InMemoryCache::new()),
        Arc::new(JwtTokenService::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours: 1,
            issuer: "folio-test".to_string(),
        })),
        Arc::new(Argon2PasswordService::new()),
        images.clone(),
        FeedConfig::default(),
    );
    let lifecycle = LifecycleService::new(repos.clone());

    let author = state.accounts.signup("Andrey", "password123").await.unwrap();
    let group = lifecycle
        .create_group(NewGroup::new("Тестовая группа", "test-slug", "Тестовое описание"))
        .await
        .unwrap();
    let post = state
        .posts
        .create(
            author.user.id,
            &PostDraft::new("Тестовый текст").with_group(group.id),
        )
        .await
        .unwrap();

    Fixture {
        state,
        repos,
        images,
        lifecycle,
        author,
        group_id: group.id,
        post_id: post.id,
    }
}

macro_rules! app {
    ($fixture:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($fixture.state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn get(uri: &str) -> test::TestRequest {
    test::TestRequest::get().uri(uri)
}

fn as_user(req: test::TestRequest, session: &Session) -> test::TestRequest {
    req.cookie(Cookie::new(SESSION_COOKIE, session.token.clone()))
}

fn location(res: &ServiceResponse) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Multipart post form: text fields first, then an `image` file part.
fn multipart_post(
    req: test::TestRequest,
    fields: &[(&str, &str)],
    file_name: &str,
    content: &[u8],
) -> test::TestRequest {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
             filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    req.insert_header((
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    ))
    .set_payload(body)
}

async fn view(res: ServiceResponse) -> Value {
    assert_eq!(res.status(), StatusCode::OK);
    test::read_body_json(res).await
}

#[actix_web::test]
async fn test_public_pages_use_expected_templates() {
    let f = fixture().await;
    let app = app!(f);

    let pages = [
        ("/", "posts/index.html"),
        ("/group/test-slug/", "posts/group_list.html"),
        ("/profile/Andrey/", "posts/profile.html"),
        ("/posts/1/", "posts/post_detail.html"),
    ];
    for (uri, template) in pages {
        let body = view(test::call_service(&app, get(uri).to_request()).await).await;
        assert_eq!(body["template"], template, "{uri}");
    }
}

#[actix_web::test]
async fn test_feed_contexts() {
    let f = fixture().await;
    let app = app!(f);

    let body = view(test::call_service(&app, get("/group/test-slug/").to_request()).await).await;
    assert_eq!(body["context"]["group"]["slug"], "test-slug");
    let first = &body["context"]["page_obj"]["object_list"][0];
    assert_eq!(first["text"], "Тестовый текст");
    assert_eq!(first["author"], "Andrey");
    assert_eq!(first["group"]["id"], f.group_id);

    let body = view(test::call_service(&app, get("/profile/Andrey/").to_request()).await).await;
    assert_eq!(body["context"]["author"]["username"], "Andrey");
    assert_eq!(body["context"]["post_count"], 1);
    assert_eq!(body["context"]["following"], false);

    let uri = format!("/posts/{}/", f.post_id);
    let body = view(test::call_service(&app, get(&uri).to_request()).await).await;
    assert_eq!(body["context"]["post"]["id"], f.post_id);
    assert_eq!(body["context"]["author_post_count"], 1);
}

#[actix_web::test]
async fn test_login_pages_use_expected_templates() {
    let f = fixture().await;
    let app = app!(f);

    let body = view(test::call_service(&app, as_user(get("/create/"), &f.author).to_request()).await).await;
    assert_eq!(body["template"], "posts/create_post.html");
    assert_eq!(body["context"]["is_edit"], false);
    assert_eq!(body["context"]["groups"][0]["slug"], "test-slug");

    let body =
        view(test::call_service(&app, as_user(get("/posts/1/edit/"), &f.author).to_request()).await).await;
    assert_eq!(body["template"], "posts/update_post.html");
    assert_eq!(body["context"]["is_edit"], true);
    assert_eq!(body["context"]["form"]["values"]["text"], "Тестовый текст");

    let body = view(test::call_service(&app, as_user(get("/follow/"), &f.author).to_request()).await).await;
    assert_eq!(body["template"], "posts/follow.html");
}

#[actix_web::test]
async fn test_anonymous_is_sent_to_login() {
    let f = fixture().await;
    let app = app!(f);

    let res = test::call_service(&app, get("/create/").to_request()).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/auth/login/?next=/create/");

    for uri in ["/posts/1/edit/", "/follow/", "/profile/Andrey/follow/"] {
        let res = test::call_service(&app, get(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), format!("/auth/login/?next={uri}"));
    }

    let req = test::TestRequest::post()
        .uri("/posts/1/comment/")
        .set_form([("text", "Комментарий")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(location(&res), "/auth/login/?next=/posts/1/comment/");
    assert!(f.repos.comments.list_for_post(1).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_non_author_edit_redirects_to_detail() {
    let f = fixture().await;
    let app = app!(f);
    let other = f.state.accounts.signup("Noauthor", "password123").await.unwrap();

    let res = test::call_service(&app, as_user(get("/posts/1/edit/"), &other).to_request()).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/posts/1/");

    let req = as_user(test::TestRequest::post().uri("/posts/1/edit/"), &other)
        .set_form([("text", "Чужая правка"), ("group", "")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(location(&res), "/posts/1/");

    let post = f.repos.posts.find_by_id(1).await.unwrap().unwrap();
    assert_eq!(post.text, "Тестовый текст");
    assert_eq!(post.group_id, Some(f.group_id));
}

#[actix_web::test]
async fn test_unknown_objects_are_404() {
    let f = fixture().await;
    let app = app!(f);

    for uri in [
        "/group/missing/",
        "/profile/nobody/",
        "/posts/999/",
        "/unexisting_page/",
    ] {
        let res = test::call_service(&app, get(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let res = test::call_service(&app, as_user(get("/posts/999/edit/"), &f.author).to_request()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_create_post_redirects_to_profile() {
    let f = fixture().await;
    let app = app!(f);
    let group = f.group_id.to_string();

    let req = as_user(test::TestRequest::post().uri("/create/"), &f.author)
        .set_form([("text", "Новый пост"), ("group", group.as_str())])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/profile/Andrey/");

    assert_eq!(f.repos.posts.count(PostScope::All).await.unwrap(), 2);
    let newest = &f.repos.posts.list(PostScope::All, 0, 1).await.unwrap()[0];
    assert_eq!(newest.text, "Новый пост");
    assert_eq!(newest.author_id, f.author.user.id);
    assert_eq!(newest.group_id, Some(f.group_id));
    assert_eq!(newest.image, None);
}

#[actix_web::test]
async fn test_create_post_with_uploaded_image() {
    let f = fixture().await;
    let app = app!(f);
    let group = f.group_id.to_string();

    let req = multipart_post(
        as_user(test::TestRequest::post().uri("/create/"), &f.author),
        &[("text", "Пост с картинкой"), ("group", group.as_str())],
        "small.gif",
        SMALL_GIF,
    )
    .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/profile/Andrey/");

    let newest = &f.repos.posts.list(PostScope::All, 0, 1).await.unwrap()[0];
    assert_eq!(newest.text, "Пост с картинкой");
    assert_eq!(newest.group_id, Some(f.group_id));
    assert_eq!(newest.image.as_deref(), Some("posts/small.gif"));
    assert_eq!(f.images.get("posts/small.gif").await.as_deref(), Some(SMALL_GIF));

    let body = view(test::call_service(&app, get("/posts/2/").to_request()).await).await;
    assert_eq!(body["context"]["post"]["image"], "posts/small.gif");
}

#[actix_web::test]
async fn test_non_image_upload_is_rerendered() {
    let f = fixture().await;
    let app = app!(f);

    let req = multipart_post(
        as_user(test::TestRequest::post().uri("/create/"), &f.author),
        &[("text", "Пост с картинкой")],
        "small.gif",
        b"just some text",
    )
    .to_request();
    let body = view(test::call_service(&app, req).await).await;

    assert_eq!(body["template"], "posts/create_post.html");
    assert!(body["context"]["form"]["errors"]["image"].is_array());
    assert_eq!(body["context"]["form"]["values"]["text"], "Пост с картинкой");
    assert_eq!(f.repos.posts.count(PostScope::All).await.unwrap(), 1);
    assert!(f.images.is_empty().await);
}

#[actix_web::test]
async fn test_author_edit_uploads_image() {
    let f = fixture().await;
    let app = app!(f);

    let req = multipart_post(
        as_user(test::TestRequest::post().uri("/posts/1/edit/"), &f.author),
        &[("text", "Тестовый текст"), ("group", "")],
        "small.gif",
        SMALL_GIF,
    )
    .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/posts/1/");

    let post = f.repos.posts.find_by_id(1).await.unwrap().unwrap();
    assert_eq!(post.image.as_deref(), Some("posts/small.gif"));

    let req = as_user(get("/posts/1/edit/"), &f.author).to_request();
    let body = view(test::call_service(&app, req).await).await;
    assert_eq!(body["context"]["form"]["values"]["image"], "posts/small.gif");
}

#[actix_web::test]
async fn test_invalid_post_form_is_rerendered() {
    let f = fixture().await;
    let app = app!(f);

    let req = as_user(test::TestRequest::post().uri("/create/"), &f.author)
        .set_form([("text", "   "), ("group", "999")])
        .to_request();
    let body = view(test::call_service(&app, req).await).await;

    assert_eq!(body["template"], "posts/create_post.html");
    assert!(body["context"]["form"]["errors"]["text"].is_array());
    assert!(body["context"]["form"]["errors"]["group"].is_array());
    assert_eq!(f.repos.posts.count(PostScope::All).await.unwrap(), 1);
}

#[actix_web::test]
async fn test_author_edit_updates_post() {
    let f = fixture().await;
    let app = app!(f);
    let before = f.repos.posts.find_by_id(1).await.unwrap().unwrap();

    let req = as_user(test::TestRequest::post().uri("/posts/1/edit/"), &f.author)
        .set_form([("text", "Измененный текст"), ("group", "")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/posts/1/");

    let after = f.repos.posts.find_by_id(1).await.unwrap().unwrap();
    assert_eq!(after.text, "Измененный текст");
    assert_eq!(after.group_id, None);
    assert_eq!(after.author_id, before.author_id);
    assert_eq!(after.pub_date, before.pub_date);
}

#[actix_web::test]
async fn test_comments() {
    let f = fixture().await;
    let app = app!(f);
    let reader = f.state.accounts.signup("Comments", "password123").await.unwrap();

    let req = as_user(test::TestRequest::post().uri("/posts/1/comment/"), &reader)
        .set_form([("text", "Тестовый комментарий")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/posts/1/");

    let body = view(test::call_service(&app, get("/posts/1/").to_request()).await).await;
    let comments = body["context"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["author"], "Comments");
    assert_eq!(comments[0]["text"], "Тестовый комментарий");

    let req = as_user(test::TestRequest::post().uri("/posts/1/comment/"), &reader)
        .set_form([("text", "")])
        .to_request();
    let body = view(test::call_service(&app, req).await).await;
    assert_eq!(body["template"], "posts/post_detail.html");
    assert!(body["context"]["form"]["errors"]["text"].is_array());
    assert_eq!(f.repos.comments.list_for_post(1).await.unwrap().len(), 1);
}

#[actix_web::test]
async fn test_deleted_user_session_is_anonymous() {
    let f = fixture().await;
    let app = app!(f);
    let ghost = f.state.accounts.signup("Ghost", "password123").await.unwrap();
    f.lifecycle.delete_user(ghost.user.id).await.unwrap();

    let req = as_user(test::TestRequest::post().uri("/posts/1/comment/"), &ghost)
        .set_form([("text", "Комментарий")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/auth/login/?next=/posts/1/comment/");

    let res = test::call_service(&app, as_user(get("/follow/"), &ghost).to_request()).await;
    assert_eq!(location(&res), "/auth/login/?next=/follow/");

    let body = view(test::call_service(&app, get("/posts/1/").to_request()).await).await;
    assert_eq!(body["context"]["comments"].as_array().unwrap().len(), 0);
    assert_eq!(f.repos.comments.list_for_post(1).await.unwrap().len(), 0);
}

#[actix_web::test]
async fn test_index_page_is_cached() {
    let f = fixture().await;
    let app = app!(f);

    let res = test::call_service(&app, get("/").to_request()).await;
    assert_eq!(res.headers().get(CACHE_STATUS_HEADER).unwrap(), "MISS");
    let first = test::read_body(res).await;

    f.lifecycle.delete_post(f.post_id).await.unwrap();

    let res = test::call_service(&app, get("/").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get(CACHE_STATUS_HEADER).unwrap(), "HIT");
    assert_eq!(test::read_body(res).await, first);

    f.state.cache.clear_prefix(INDEX_CACHE_PREFIX).await.unwrap();

    let body = view(test::call_service(&app, get("/").to_request()).await).await;
    assert_eq!(body["context"]["page_obj"]["count"], 0);
}

#[actix_web::test]
async fn test_follow_and_unfollow() {
    let f = fixture().await;
    let app = app!(f);
    let reader = f.state.accounts.signup("User", "password123").await.unwrap();
    let bystander = f.state.accounts.signup("Bystander", "password123").await.unwrap();

    let res = test::call_service(&app, as_user(get("/profile/Andrey/follow/"), &reader).to_request()).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/profile/Andrey/");
    assert_eq!(f.repos.follows.count_by_user(reader.user.id).await.unwrap(), 1);

    // Following twice keeps a single edge.
    test::call_service(&app, as_user(get("/profile/Andrey/follow/"), &reader).to_request()).await;
    assert_eq!(f.repos.follows.count_by_user(reader.user.id).await.unwrap(), 1);

    let body = view(test::call_service(&app, as_user(get("/follow/"), &reader).to_request()).await).await;
    let posts = body["context"]["page_obj"]["object_list"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["text"], "Тестовый текст");

    let body = view(test::call_service(&app, as_user(get("/follow/"), &bystander).to_request()).await).await;
    assert_eq!(body["context"]["page_obj"]["count"], 0);

    let body =
        view(test::call_service(&app, as_user(get("/profile/Andrey/"), &reader).to_request()).await).await;
    assert_eq!(body["context"]["following"], true);

    let req = as_user(test::TestRequest::post().uri("/profile/Andrey/unfollow/"), &reader).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(location(&res), "/profile/Andrey/");
    assert_eq!(f.repos.follows.count_by_user(reader.user.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_self_follow_is_ignored() {
    let f = fixture().await;
    let app = app!(f);

    let res = test::call_service(&app, as_user(get("/profile/Andrey/follow/"), &f.author).to_request()).await;
    assert_eq!(location(&res), "/profile/Andrey/");
    assert_eq!(f.repos.follows.count_by_user(f.author.user.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_feeds_paginate_over_http() {
    let f = fixture().await;
    let app = app!(f);
    for n in 0..12 {
        f.state
            .posts
            .create(
                f.author.user.id,
                &PostDraft::new(format!("Пост {n}")).with_group(f.group_id),
            )
            .await
            .unwrap();
    }

    for (uri, expected) in [
        ("/", 10),
        ("/?page=2", 3),
        ("/group/test-slug/", 10),
        ("/group/test-slug/?page=2", 3),
        ("/profile/Andrey/?page=2", 3),
        ("/profile/Andrey/?page=abc", 10),
        ("/?page=99999999999999999999", 3),
        ("/group/test-slug/?page=99999999999999999999", 3),
    ] {
        let body = view(test::call_service(&app, get(uri).to_request()).await).await;
        let posts = body["context"]["page_obj"]["object_list"].as_array().unwrap();
        assert_eq!(posts.len(), expected, "{uri}");
    }
}

#[actix_web::test]
async fn test_signup_and_login() {
    let f = fixture().await;
    let app = app!(f);

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([("username", "Newbie"), ("password", "password123")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");
    assert!(res.response().cookies().any(|c| c.name() == SESSION_COOKIE));

    let req = test::TestRequest::post()
        .uri("/auth/login/?next=/create/")
        .set_form([("username", "Newbie"), ("password", "password123")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/create/");

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "Newbie"), ("password", "wrong-password")])
        .to_request();
    let body = view(test::call_service(&app, req).await).await;
    assert_eq!(body["template"], "users/login.html");
    assert!(body["context"]["form"]["errors"]["__all__"].is_array());
}

#[actix_web::test]
async fn test_bearer_token_is_accepted() {
    let f = fixture().await;
    let app = app!(f);

    let req = get("/follow/")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", f.author.token)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_health() {
    let f = fixture().await;
    let app = app!(f);

    let body = view(test::call_service(&app, get("/health").to_request()).await).await;
    assert_eq!(body["status"], "ok");
}
