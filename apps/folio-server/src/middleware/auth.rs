//! Session identity, the login guard and their extractors.

use std::future::{Ready, ready};
use std::rc::Rc;

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
    web,
};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "folio_session";

pub const LOGIN_PATH: &str = "/auth/login/";

/// The signed-in user.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

/// Outcome of session resolution, kept in the request extensions so the
/// guard and the extractors look the user up once per request.
#[derive(Clone)]
struct ResolvedSession(Option<Identity>);

/// Session token from the cookie, else from `Authorization: Bearer`.
fn session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

/// Resolve the identity of `req`, caching it in the request extensions.
///
/// A token is only honoured while its user still exists; a deleted account
/// leaves the request anonymous.
async fn resolve(req: &HttpRequest) -> Option<Identity> {
    let cached = req.extensions().get::<ResolvedSession>().cloned();
    if let Some(ResolvedSession(identity)) = cached {
        return identity;
    }

    let identity = lookup(req).await;
    req.extensions_mut().insert(ResolvedSession(identity.clone()));
    identity
}

async fn lookup(req: &HttpRequest) -> Option<Identity> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return None;
    };
    let token = session_token(req)?;

    match state.accounts.session_user(&token).await {
        Ok(user) => user.map(|user| Identity {
            user_id: user.id,
            username: user.username,
        }),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load session user");
            None
        }
    }
}

/// Where an anonymous visitor of `target` is sent: `/auth/login/?next=<target>`.
pub fn login_redirect_url(target: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("{LOGIN_PATH}?next={}", encoded.replace("%2F", "/"))
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            resolve(&req).await.ok_or_else(|| {
                tracing::debug!("Request without a valid session");
                AppError::LoginRequired(req.uri().to_string())
            })
        })
    }
}

/// Identity when a valid session is present; never fails.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|identity| identity.user_id)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { Ok(OptionalIdentity(resolve(&req).await)) })
    }
}

/// Guard for pages that need a signed-in user.
///
/// Anonymous requests get `302 Found` to the login page with the original
/// path in `next`; the wrapped handler never runs for them.
pub struct RequireLogin;

impl<S, B> Transform<S, ServiceRequest> for RequireLogin
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireLoginService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireLoginService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireLoginService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireLoginService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            if resolve(req.request()).await.is_none() {
                let target = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| req.path().to_string());
                tracing::debug!(path = %target, "Redirecting anonymous request to login");

                let response = HttpResponse::Found()
                    .insert_header((header::LOCATION, login_redirect_url(&target)))
                    .finish()
                    .map_into_right_body();
                return Ok(req.into_response(response));
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_keeps_slashes() {
        assert_eq!(login_redirect_url("/create/"), "/auth/login/?next=/create/");
        assert_eq!(
            login_redirect_url("/posts/1/edit/"),
            "/auth/login/?next=/posts/1/edit/"
        );
    }

    #[test]
    fn test_login_redirect_encodes_query() {
        assert_eq!(
            login_redirect_url("/follow/?page=2"),
            "/auth/login/?next=/follow/%3Fpage%3D2"
        );
    }
}
