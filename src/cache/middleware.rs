//! Output cache middleware.
//!
//! Serves cached GET responses and stores successful, cookie-free responses.
//! Bodies without a known size within `body_limit_bytes` pass through uncached.

use std::sync::Arc;

use axum::{
    body::{Body, HttpBody},
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument, warn};

use super::{
    CacheConfig,
    store::{CachedResponse, OutputCacheStore, OutputKey},
};

#[derive(Clone)]
pub struct CacheState {
    pub config: CacheConfig,
    pub store: Arc<OutputCacheStore>,
}

#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn output_cache_layer(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config.enabled || request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = OutputKey::new(request.uri().path(), request.uri().query().unwrap_or(""));

    if let Some(cached) = cache.store.get(&key) {
        debug!(cache = "output", outcome = "hit", "serving cached response");
        return build_response(cached);
    }

    debug!(cache = "output", outcome = "miss", "executing handler");
    let generation = cache.store.generation();
    let response = next.run(request).await;

    if !is_cacheable(&response) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let fits = body
        .size_hint()
        .upper()
        .is_some_and(|upper| upper <= cache.config.body_limit_bytes as u64);
    if !fits {
        debug!(
            cache = "output",
            limit = cache.config.body_limit_bytes,
            "response body too large or unsized; not cached"
        );
        return Response::from_parts(parts, body);
    }

    let bytes = match axum::body::to_bytes(body, cache.config.body_limit_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(
                cache = "output",
                error = %err,
                "response body could not be buffered"
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let cached = CachedResponse {
        status: parts.status.as_u16(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect(),
        body: bytes.clone(),
    };
    if !cache.store.set_if_generation(generation, key, cached) {
        debug!(cache = "output", "cache purged while rendering; response not stored");
    }

    Response::from_parts(parts, Body::from(bytes))
}

fn is_cacheable(response: &Response) -> bool {
    response.status() == StatusCode::OK && !response.headers().contains_key(header::SET_COOKIE)
}

fn build_response(cached: CachedResponse) -> Response {
    let mut builder = Response::builder().status(cached.status);

    for (name, value) in cached.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }

    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
