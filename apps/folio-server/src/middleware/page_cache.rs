//! Read-through whole-page cache for GET responses.

use std::future::{Ready, ready};
use std::rc::Rc;

use actix_web::{
    Error, HttpResponse,
    body::{BoxBody, MessageBody, to_bytes},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{Method, StatusCode, header},
    web,
};
use futures::future::LocalBoxFuture;

use crate::state::AppState;

/// Response header telling whether the body came from the cache.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Caches successful GET responses for the configured index TTL.
///
/// Entries are keyed by `<prefix>:<path and query>` and are never
/// invalidated by writes; they simply expire.
pub struct PageCache {
    prefix: &'static str,
}

impl PageCache {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix }
    }
}

impl<S, B> Transform<S, ServiceRequest> for PageCache
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = PageCacheService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PageCacheService {
            service: Rc::new(service),
            prefix: self.prefix,
        }))
    }
}

pub struct PageCacheService<S> {
    service: Rc<S>,
    prefix: &'static str,
}

impl<S, B> Service<ServiceRequest> for PageCacheService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        let (state, key) = match state {
            Some(state) if req.method() == Method::GET => {
                let target = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                let key = format!("{}:{}", self.prefix, target);
                (state, key)
            }
            _ => {
                return Box::pin(async move {
                    Ok(service.call(req).await?.map_into_boxed_body())
                });
            }
        };

        Box::pin(async move {
            if let Some(body) = state.cache.get(&key).await {
                tracing::debug!(key = %key, "Page cache hit");
                let response = HttpResponse::Ok()
                    .content_type(header::ContentType::json())
                    .insert_header((CACHE_STATUS_HEADER, "HIT"))
                    .body(body);
                return Ok(req.into_response(response));
            }

            let res = service.call(req).await?;
            if res.status() != StatusCode::OK {
                return Ok(res.map_into_boxed_body());
            }

            let (req, res) = res.into_parts();
            let (mut res, body) = res.into_parts();
            let bytes = to_bytes(body).await.map_err(|e| {
                let e: Box<dyn std::error::Error> = e.into();
                actix_web::error::ErrorInternalServerError(e.to_string())
            })?;

            match std::str::from_utf8(&bytes) {
                Ok(text) => {
                    let ttl = state.feeds.config().index_cache_ttl;
                    if let Err(e) = state.cache.set(&key, text, Some(ttl)).await {
                        tracing::warn!(key = %key, error = %e, "Failed to store page");
                    }
                }
                Err(_) => tracing::debug!(key = %key, "Skipping non-UTF-8 page"),
            }

            res.headers_mut().insert(
                header::HeaderName::from_static(CACHE_STATUS_HEADER),
                header::HeaderValue::from_static("MISS"),
            );
            let res = res.set_body(bytes).map_into_boxed_body();
            Ok(ServiceResponse::new(req, res))
        })
    }
}
