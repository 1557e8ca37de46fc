pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod media;
pub mod pagination;
pub mod routes;

use axum::extract::FromRef;
use jsonwebtoken::{DecodingKey, EncodingKey};
use sqlx::SqlitePool;

use crate::{cache::PageCache, config::Config, media::MediaStore};

/// Cache key prefix of the home feed.
pub const INDEX_CACHE_PREFIX: &str = "index_page";

/// Number of posts on one page of any listing.
#[derive(Debug, Clone, Copy)]
pub struct PageSize(pub u32);

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    pub page_cache: PageCache,
    pub media: MediaStore,
    pub page_size: PageSize,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        let secret = config.jwt_secret.as_bytes();

        Self {
            pool,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            page_cache: PageCache::new(INDEX_CACHE_PREFIX, config.index_cache_ttl()),
            media: MediaStore::new(config.media_root.clone()),
            page_size: PageSize(config.posts_per_page),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> SqlitePool {
        app_state.pool.clone()
    }
}

impl FromRef<AppState> for EncodingKey {
    fn from_ref(app_state: &AppState) -> EncodingKey {
        app_state.encoding_key.clone()
    }
}

impl FromRef<AppState> for DecodingKey {
    fn from_ref(app_state: &AppState) -> DecodingKey {
        app_state.decoding_key.clone()
    }
}

impl FromRef<AppState> for PageCache {
    fn from_ref(app_state: &AppState) -> PageCache {
        app_state.page_cache.clone()
    }
}

impl FromRef<AppState> for MediaStore {
    fn from_ref(app_state: &AppState) -> MediaStore {
        app_state.media.clone()
    }
}

impl FromRef<AppState> for PageSize {
    fn from_ref(app_state: &AppState) -> PageSize {
        app_state.page_size
    }
}
