//! Signup, login and logout.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{HttpResponse, web};

use folio_core::DomainError;
use folio_core::domain::FieldErrors;
use folio_core::services::Session;
use folio_shared::dto::{AuthFormContext, FormState, LoginForm, NextQuery, SignupForm};

use super::views::{form_state, redirect, render};
use crate::middleware::auth::SESSION_COOKIE;
use crate::middleware::error::AppResult;
use crate::state::AppState;

const INVALID_LOGIN: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Only same-site paths are followed after login.
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

fn session_cookie(session: &Session, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, session.token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_secs))
        .finish()
}

fn signed_in(state: &AppState, session: &Session, location: &str) -> HttpResponse {
    let mut response = redirect(location);
    if let Err(e) = response.add_cookie(&session_cookie(session, state.tokens.expiration_seconds())) {
        tracing::error!(error = %e, "Failed to set session cookie");
    }
    response
}

/// GET /auth/signup/
pub async fn signup_form() -> HttpResponse {
    render(
        "users/signup.html",
        AuthFormContext {
            form: FormState::default(),
            next: None,
        },
    )
}

/// POST /auth/signup/ - create the account and sign in.
pub async fn signup(
    state: web::Data<AppState>,
    form: web::Form<SignupForm>,
) -> AppResult<HttpResponse> {
    match state.accounts.signup(&form.username, &form.password).await {
        Ok(session) => Ok(signed_in(&state, &session, "/")),
        Err(DomainError::Validation(errors)) => Ok(render(
            "users/signup.html",
            AuthFormContext {
                form: form_state([("username", form.username.as_str())], &errors),
                next: None,
            },
        )),
        Err(e) => Err(e.into()),
    }
}

/// GET /auth/login/
pub async fn login_form(query: web::Query<NextQuery>) -> HttpResponse {
    render(
        "users/login.html",
        AuthFormContext {
            form: FormState::default(),
            next: query.into_inner().next,
        },
    )
}

/// POST /auth/login/ - on success go to `next`, else the index.
pub async fn login(
    state: web::Data<AppState>,
    query: web::Query<NextQuery>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let next = form.next.clone().or_else(|| query.into_inner().next);

    match state.accounts.login(&form.username, &form.password).await {
        Ok(session) => {
            let location = safe_next(next.as_deref()).unwrap_or("/");
            Ok(signed_in(&state, &session, location))
        }
        Err(DomainError::Unauthorized) => {
            let errors = FieldErrors::single("__all__", INVALID_LOGIN);
            Ok(render(
                "users/login.html",
                AuthFormContext {
                    form: form_state([("username", form.username.as_str())], &errors),
                    next,
                },
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET|POST /auth/logout/
pub async fn logout() -> HttpResponse {
    let mut response = render("users/logged_out.html", ());
    let mut expired = Cookie::new(SESSION_COOKIE, "");
    expired.set_path("/");
    expired.make_removal();
    if let Err(e) = response.add_cookie(&expired) {
        tracing::error!(error = %e, "Failed to clear session cookie");
    }
    response
}
