use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    auth::CurrentUser,
    db::{self, PostFilter},
    error::AppResult,
    pagination::PageQuery,
    PageSize,
};

use super::{found, profile_url};

// GET /follow/
pub async fn follow_index(
    State(pool): State<SqlitePool>,
    State(PageSize(per_page)): State<PageSize>,
    Query(params): Query<PageQuery>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let page = db::list_posts(
        &pool,
        PostFilter::FollowedBy(user.id),
        params.page.as_deref(),
        per_page,
    )
    .await?;

    Ok(Json(json!({ "page": page })))
}

// GET /profile/:username/follow/
pub async fn profile_follow(
    State(pool): State<SqlitePool>,
    Path(username): Path<String>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Response> {
    let author = db::get_user_by_username(&pool, &username).await?;

    if db::follow(&pool, user.id, author.id).await? {
        tracing::debug!("{} now follows {}", user.username, author.username);
    }

    Ok(found(&profile_url(&author.username)))
}

// GET /profile/:username/unfollow/
pub async fn profile_unfollow(
    State(pool): State<SqlitePool>,
    Path(username): Path<String>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Response> {
    let author = db::get_user_by_username(&pool, &username).await?;

    if db::unfollow(&pool, user.id, author.id).await? {
        tracing::debug!("{} unfollowed {}", user.username, author.username);
    }

    Ok(found(&profile_url(&author.username)))
}
