//! Feed pages, post detail, authoring and comments.

use actix_web::{HttpResponse, web};

use folio_core::DomainError;
use folio_core::domain::FieldErrors;
use folio_core::services::EditAccess;
use folio_shared::dto::{
    CommentForm, FormState, GroupContext, IndexContext, PageQuery, PostFormContext,
    ProfileContext,
};

use super::upload::PostSubmission;
use super::views::{
    author_dto, detail_context, form_state, group_dto, page_dto, post_draft, post_form_from,
    post_form_state, post_url, profile_url, redirect, render,
};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET / - every post, newest first. Served through the page cache.
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state.feeds.global(query.page.as_deref()).await?;
    Ok(render(
        "posts/index.html",
        IndexContext {
            page_obj: page_dto(page),
        },
    ))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let feed = state.feeds.group(&slug, query.page.as_deref()).await?;
    Ok(render(
        "posts/group_list.html",
        GroupContext {
            group: group_dto(feed.group),
            page_obj: page_dto(feed.page),
        },
    ))
}

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
    viewer: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let feed = state
        .feeds
        .profile(&username, viewer.user_id(), query.page.as_deref())
        .await?;
    Ok(render(
        "posts/profile.html",
        ProfileContext {
            author: author_dto(&feed.author),
            post_count: feed.post_count,
            following: feed.following,
            page_obj: page_dto(feed.page),
        },
    ))
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let detail = state.posts.detail(*post_id).await?;
    Ok(render(
        "posts/post_detail.html",
        detail_context(detail, FormState::default()),
    ))
}

async fn render_post_form(
    state: &AppState,
    form: FormState,
    post_id: Option<i64>,
) -> AppResult<HttpResponse> {
    let groups = state.posts.group_choices().await?;
    let (template, is_edit) = match post_id {
        Some(_) => ("posts/update_post.html", true),
        None => ("posts/create_post.html", false),
    };
    Ok(render(
        template,
        PostFormContext {
            form,
            groups: groups.into_iter().map(group_dto).collect(),
            is_edit,
            post_id,
        },
    ))
}

/// GET /create/
pub async fn post_create_form(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    render_post_form(&state, FormState::default(), None).await
}

/// POST /create/ - publish, then show the author's profile.
pub async fn post_create(
    state: web::Data<AppState>,
    identity: Identity,
    submission: PostSubmission,
) -> AppResult<HttpResponse> {
    let PostSubmission { form, image } = submission;
    let image_name = image.as_ref().map(|upload| upload.file_name.clone());
    let result = match post_draft(&form, image) {
        Ok(draft) => state.posts.create(identity.user_id, &draft).await,
        Err(errors) => Err(DomainError::Validation(errors)),
    };

    match result {
        Ok(_) => Ok(redirect(profile_url(&identity.username))),
        Err(DomainError::Validation(errors)) => {
            let form = post_form_state(&form, image_name.as_deref(), &errors);
            render_post_form(&state, form, None).await
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /posts/{post_id}/edit/ - the author gets the form, anyone else the post.
pub async fn post_edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post_id = post_id.into_inner();
    match state.posts.editable(identity.user_id, post_id).await? {
        EditAccess::Granted(post) => {
            let form = post_form_state(
                &post_form_from(&post),
                post.image.as_deref(),
                &FieldErrors::new(),
            );
            render_post_form(&state, form, Some(post_id)).await
        }
        EditAccess::Denied => Ok(redirect(post_url(post_id))),
    }
}

/// POST /posts/{post_id}/edit/
pub async fn post_edit(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<i64>,
    submission: PostSubmission,
) -> AppResult<HttpResponse> {
    let post_id = post_id.into_inner();
    if state.posts.editable(identity.user_id, post_id).await? == EditAccess::Denied {
        return Ok(redirect(post_url(post_id)));
    }

    let PostSubmission { form, image } = submission;
    let image_name = image.as_ref().map(|upload| upload.file_name.clone());
    let result = match post_draft(&form, image) {
        Ok(draft) => state.posts.edit(identity.user_id, post_id, &draft).await,
        Err(errors) => Err(DomainError::Validation(errors)),
    };

    match result {
        Ok(_) => Ok(redirect(post_url(post_id))),
        Err(DomainError::Validation(errors)) => {
            let form = post_form_state(&form, image_name.as_deref(), &errors);
            render_post_form(&state, form, Some(post_id)).await
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /posts/{post_id}/comment/
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<i64>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let post_id = post_id.into_inner();
    match state
        .posts
        .add_comment(identity.user_id, post_id, &form.text)
        .await
    {
        Ok(_) => Ok(redirect(post_url(post_id))),
        Err(DomainError::Validation(errors)) => {
            let detail = state.posts.detail(post_id).await?;
            let form = form_state([("text", form.text.as_str())], &errors);
            Ok(render("posts/post_detail.html", detail_context(detail, form)))
        }
        Err(e) => Err(e.into()),
    }
}
