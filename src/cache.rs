//! Whole-response caching for hot pages.
//!
//! Entries are keyed by a fixed prefix, the request URI and the request's
//! `Cookie` header, so anonymous visitors and each session see their own
//! copy. Only successful `GET` responses are stored, and they live for a
//! fixed time-to-live.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use moka::future::Cache;

const MAX_ENTRIES: u64 = 10_000;

#[derive(Debug, Clone)]
struct CachedPage {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl CachedPage {
    fn to_response(&self) -> Response {
        let mut response = (self.status, self.body.clone()).into_response();
        *response.headers_mut() = self.headers.clone();
        response
    }
}

#[derive(Clone)]
pub struct PageCache {
    prefix: &'static str,
    ttl: Duration,
    pages: Cache<String, CachedPage>,
}

impl PageCache {
    pub fn new(prefix: &'static str, ttl: Duration) -> Self {
        let pages = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .build();

        Self { prefix, ttl, pages }
    }

    pub fn clear(&self) {
        self.pages.invalidate_all();
    }

    fn key<B>(&self, request: &Request<B>) -> String {
        let cookies = request
            .headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");

        format!("{}.{}.{}", self.prefix, request.uri(), cookies)
    }
}

pub async fn cache_page<B>(
    State(cache): State<PageCache>,
    request: Request<B>,
    next: Next<B>,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = cache.key(&request);
    if let Some(page) = cache.pages.get(&key).await {
        tracing::trace!("page cache hit for {key}");
        return page.to_response();
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let body = match hyper::body::to_bytes(body).await {
        Ok(body) => body,
        Err(err) => {
            tracing::error!("failed to buffer response for the page cache: {err:?}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if let Ok(max_age) = HeaderValue::from_str(&format!("max-age={}", cache.ttl.as_secs())) {
        parts.headers.insert(header::CACHE_CONTROL, max_age);
    }
    parts
        .headers
        .insert(header::VARY, HeaderValue::from_static("Cookie"));

    let page = CachedPage {
        status: parts.status,
        headers: parts.headers,
        body,
    };
    cache.pages.insert(key, page.clone()).await;

    page.to_response()
}
