use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    auth::{CurrentUser, MaybeUser},
    db::{self, NewPost, Post, PostFilter, PostId},
    error::AppResult,
    forms::{BoundForm, CommentForm, PostForm, PostSubmission},
    media::MediaStore,
    pagination::PageQuery,
    PageSize,
};

use super::{found, parse_post_id, post_url, profile_url};

// GET /
pub async fn index(
    State(pool): State<SqlitePool>,
    State(PageSize(per_page)): State<PageSize>,
    Query(params): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    let page = db::list_posts(&pool, PostFilter::All, params.page.as_deref(), per_page).await?;
    Ok(Json(json!({ "page": page })))
}

// GET /group/:slug/
pub async fn group_posts(
    State(pool): State<SqlitePool>,
    State(PageSize(per_page)): State<PageSize>,
    Path(slug): Path<String>,
    Query(params): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    let group = db::get_group_by_slug(&pool, &slug).await?;
    let page = db::list_posts(
        &pool,
        PostFilter::Group(group.id),
        params.page.as_deref(),
        per_page,
    )
    .await?;

    Ok(Json(json!({ "group": group, "page": page })))
}

// GET /profile/:username/
pub async fn profile(
    State(pool): State<SqlitePool>,
    State(PageSize(per_page)): State<PageSize>,
    Path(username): Path<String>,
    Query(params): Query<PageQuery>,
    MaybeUser(user): MaybeUser,
) -> AppResult<impl IntoResponse> {
    let author = db::get_user_by_username(&pool, &username).await?;

    let following = match user {
        Some(user) => db::is_following(&pool, user.id, author.id).await?,
        None => false,
    };

    let page = db::list_posts(
        &pool,
        PostFilter::Author(author.id),
        params.page.as_deref(),
        per_page,
    )
    .await?;

    Ok(Json(json!({
        "author": author,
        "count": page.count,
        "following": following,
        "page": page,
    })))
}

// GET /posts/:id/
pub async fn post_detail(
    State(pool): State<SqlitePool>,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let post_id = parse_post_id(&post_id)?;
    render_post_detail(&pool, post_id, BoundForm::unbound(CommentForm::default())).await
}

/// The post page: the post, its comments and the comment form (possibly
/// carrying the errors of a rejected comment).
pub(crate) async fn render_post_detail(
    pool: &SqlitePool,
    post_id: PostId,
    form: BoundForm<CommentForm>,
) -> AppResult<Response> {
    let post = db::get_post(pool, post_id).await?;
    let author_posts_count = db::count_posts(pool, PostFilter::Author(post.author.id)).await?;
    let comments = db::list_comments(pool, post.id).await?;

    Ok(Json(json!({
        "post": post,
        "author_posts_count": author_posts_count,
        "comments": comments,
        "form": form,
    }))
    .into_response())
}

async fn render_post_form(
    pool: &SqlitePool,
    form: BoundForm<PostForm>,
    editing: Option<&Post>,
) -> AppResult<Response> {
    let groups = db::list_groups(pool).await?;

    let mut context = json!({
        "form": form,
        "groups": groups,
        "is_edit": editing.is_some(),
    });
    if let Some(post) = editing {
        context["post"] = json!(post);
    }

    Ok(Json(context).into_response())
}

// GET /create/
pub async fn new_post(
    State(pool): State<SqlitePool>,
    CurrentUser(_user): CurrentUser,
) -> AppResult<Response> {
    render_post_form(&pool, BoundForm::unbound(PostForm::default()), None).await
}

// POST /create/
pub async fn create_post(
    State(pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    CurrentUser(user): CurrentUser,
    submission: PostSubmission,
) -> AppResult<Response> {
    let post = match submission.clean(&pool).await? {
        Ok(post) => post,
        Err(form) => return render_post_form(&pool, form, None).await,
    };

    let image = match &post.image {
        Some((upload, kind)) => Some(media.save_post_image(upload, *kind).await?),
        None => None,
    };

    let post_id = db::create_post(
        &pool,
        NewPost {
            text: &post.text,
            author_id: user.id,
            group_id: post.group_id,
            image: image.as_deref(),
        },
    )
    .await?;

    tracing::info!("{} published post {post_id}", user.username);
    Ok(found(&profile_url(&user.username)))
}

// GET /posts/:id/edit/
pub async fn edit_post_form(
    State(pool): State<SqlitePool>,
    Path(post_id): Path<String>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Response> {
    let post = db::get_post(&pool, parse_post_id(&post_id)?).await?;

    if post.author.id != user.id {
        return Ok(found(&post_url(post.id)));
    }

    let form = PostForm {
        text: post.text.clone(),
        group: post.group.as_ref().map(|group| group.id.to_string()),
    };
    render_post_form(&pool, BoundForm::unbound(form), Some(&post)).await
}

// POST /posts/:id/edit/
pub async fn edit_post(
    State(pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    Path(post_id): Path<String>,
    CurrentUser(user): CurrentUser,
    submission: PostSubmission,
) -> AppResult<Response> {
    let post = db::get_post(&pool, parse_post_id(&post_id)?).await?;

    if post.author.id != user.id {
        tracing::debug!("{} may not edit post {}", user.username, post.id);
        return Ok(found(&post_url(post.id)));
    }

    let cleaned = match submission.clean(&pool).await? {
        Ok(cleaned) => cleaned,
        Err(form) => return render_post_form(&pool, form, Some(&post)).await,
    };

    let image = match &cleaned.image {
        Some((upload, kind)) => Some(media.save_post_image(upload, *kind).await?),
        None => None,
    };

    db::update_post(
        &pool,
        post.id,
        &cleaned.text,
        cleaned.group_id,
        image.as_deref(),
    )
    .await?;

    Ok(found(&post_url(post.id)))
}
