//! Following feed and follow/unfollow actions.

use actix_web::{HttpResponse, web};

use folio_core::services::FollowOutcome;
use folio_shared::dto::{IndexContext, PageQuery};

use super::views::{page_dto, profile_url, redirect, render};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /follow/ - posts by authors the user follows.
pub async fn follow_index(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .feeds
        .following(identity.user_id, query.page.as_deref())
        .await?;
    Ok(render(
        "posts/follow.html",
        IndexContext {
            page_obj: page_dto(page),
        },
    ))
}

/// GET|POST /profile/{username}/follow/
pub async fn profile_follow(
    state: web::Data<AppState>,
    identity: Identity,
    username: web::Path<String>,
) -> AppResult<HttpResponse> {
    let outcome = state.follows.follow(identity.user_id, &username).await?;
    if outcome == FollowOutcome::SelfFollowRejected {
        tracing::debug!(username = %username, "Ignoring self-follow");
    }
    Ok(redirect(profile_url(&username)))
}

/// GET|POST /profile/{username}/unfollow/
pub async fn profile_unfollow(
    state: web::Data<AppState>,
    identity: Identity,
    username: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.follows.unfollow(identity.user_id, &username).await?;
    Ok(redirect(profile_url(&username)))
}
