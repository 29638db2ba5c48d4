//! Domain values to template contexts, plus response helpers.

use actix_web::{HttpResponse, http::header};
use serde::Serialize;

use folio_core::domain::{FieldErrors, Group, ImageUpload, Post, PostDraft, User};
use folio_core::pagination::Page;
use folio_core::services::{CommentEntry, INVALID_GROUP, PostDetail, PostEntry};
use folio_shared::View;
use folio_shared::dto::{
    AuthorDto, CommentDto, FormState, GroupDto, PageDto, PostCard, PostDetailContext, PostForm,
};

/// `200 OK` with the template name and its context.
pub fn render<C: Serialize>(template: &str, context: C) -> HttpResponse {
    HttpResponse::Ok().json(View::new(template, context))
}

/// `302 Found` to `location`.
pub fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{username}/")
}

pub fn post_url(post_id: i64) -> String {
    format!("/posts/{post_id}/")
}

pub fn group_dto(group: Group) -> GroupDto {
    GroupDto {
        id: group.id,
        title: group.title,
        slug: group.slug,
        description: group.description,
    }
}

pub fn author_dto(user: &User) -> AuthorDto {
    AuthorDto {
        id: user.id,
        username: user.username.clone(),
    }
}

pub fn post_card(entry: PostEntry) -> PostCard {
    PostCard {
        id: entry.post.id,
        text: entry.post.text,
        pub_date: entry.post.pub_date,
        author: entry.author,
        group: entry.group.map(group_dto),
        image: entry.post.image,
    }
}

fn comment_dto(entry: CommentEntry) -> CommentDto {
    CommentDto {
        id: entry.comment.id,
        author: entry.author,
        text: entry.comment.text,
        created: entry.comment.created,
    }
}

pub fn page_dto(page: Page<PostEntry>) -> PageDto<PostCard> {
    PageDto {
        has_next: page.has_next(),
        has_previous: page.has_previous(),
        next_page_number: page.next_page_number(),
        previous_page_number: page.previous_page_number(),
        number: page.number,
        num_pages: page.num_pages,
        count: page.count,
        object_list: page.items.into_iter().map(post_card).collect(),
    }
}

pub fn detail_context(detail: PostDetail, form: FormState) -> PostDetailContext {
    PostDetailContext {
        post: post_card(detail.entry),
        author_post_count: detail.author_post_count,
        comments: detail.comments.into_iter().map(comment_dto).collect(),
        form,
    }
}

/// Submitted values echoed back, with `errors` attached per field.
pub fn form_state<'a>(
    values: impl IntoIterator<Item = (&'a str, &'a str)>,
    errors: &FieldErrors,
) -> FormState {
    let mut form = FormState::default();
    for (field, value) in values {
        form = form.with_value(field, value);
    }
    for (field, messages) in errors.iter() {
        for message in messages {
            form = form.with_error(field, message.as_str());
        }
    }
    form
}

/// `image` is the name shown for the file field: the stored path when
/// editing, the submitted file name on a re-render.
pub fn post_form_state(
    form: &PostForm,
    image: Option<&str>,
    errors: &FieldErrors,
) -> FormState {
    form_state(
        [
            ("text", form.text.as_str()),
            ("group", form.group.as_deref().unwrap_or_default()),
            ("image", image.unwrap_or_default()),
        ],
        errors,
    )
}

/// The stored post as an unsubmitted edit form.
pub fn post_form_from(post: &Post) -> PostForm {
    PostForm {
        text: post.text.clone(),
        group: post.group_id.map(|id| id.to_string()),
    }
}

/// Turn the raw form into a draft. A group value that is not an id fails
/// here, together with any other field problems.
pub fn post_draft(
    form: &PostForm,
    image: Option<ImageUpload>,
) -> Result<PostDraft, FieldErrors> {
    let mut draft = PostDraft::new(form.text.as_str());
    draft.image = image;

    match form.group.as_deref().map(str::trim) {
        None | Some("") => Ok(draft),
        Some(raw) => match raw.parse::<i64>() {
            Ok(group_id) => Ok(draft.with_group(group_id)),
            Err(_) => {
                let mut errors = draft.validate().err().unwrap_or_default();
                errors.add("group", INVALID_GROUP);
                Err(errors)
            }
        },
    }
}
