//! HTTP handlers and route configuration.

mod auth;
mod follows;
mod health;
mod posts;
mod upload;
mod views;

#[cfg(test)]
mod tests;

use actix_web::{HttpRequest, HttpResponse, web};

use folio_shared::ErrorResponse;

use crate::middleware::auth::RequireLogin;
use crate::middleware::page_cache::PageCache;

/// Cache key prefix of the index page.
pub const INDEX_CACHE_PREFIX: &str = "index_page";

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        // Feeds
        .service(
            web::resource("/")
                .wrap(PageCache::new(INDEX_CACHE_PREFIX))
                .route(web::get().to(posts::index)),
        )
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .route("/profile/{username}/", web::get().to(posts::profile))
        .route("/posts/{post_id}/", web::get().to(posts::post_detail))
        .service(
            web::resource("/follow/")
                .wrap(RequireLogin)
                .route(web::get().to(follows::follow_index)),
        )
        // Authoring
        .service(
            web::resource("/create/")
                .wrap(RequireLogin)
                .route(web::get().to(posts::post_create_form))
                .route(web::post().to(posts::post_create)),
        )
        .service(
            web::resource("/posts/{post_id}/edit/")
                .wrap(RequireLogin)
                .route(web::get().to(posts::post_edit_form))
                .route(web::post().to(posts::post_edit)),
        )
        .service(
            web::resource("/posts/{post_id}/comment/")
                .wrap(RequireLogin)
                .route(web::post().to(posts::add_comment)),
        )
        // Following
        .service(
            web::resource("/profile/{username}/follow/")
                .wrap(RequireLogin)
                .route(web::get().to(follows::profile_follow))
                .route(web::post().to(follows::profile_follow)),
        )
        .service(
            web::resource("/profile/{username}/unfollow/")
                .wrap(RequireLogin)
                .route(web::get().to(follows::profile_unfollow))
                .route(web::post().to(follows::profile_unfollow)),
        )
        // Accounts
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/signup/")
                        .route(web::get().to(auth::signup_form))
                        .route(web::post().to(auth::signup)),
                )
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_form))
                        .route(web::post().to(auth::login)),
                )
                .service(
                    web::resource("/logout/")
                        .route(web::get().to(auth::logout))
                        .route(web::post().to(auth::logout)),
                ),
        )
        .default_service(web::to(not_found));
}

/// Anything unrouted.
async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(
        ErrorResponse::not_found("No route matches this path").with_instance(req.path()),
    )
}
