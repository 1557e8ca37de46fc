use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    auth::CurrentUser,
    db,
    error::AppResult,
    forms::{BoundForm, CommentForm, FormErrors},
};

use super::{found, parse_post_id, post_url, posts::render_post_detail};

// POST /posts/:id/comment/ and POST /posts/:id/
pub async fn add_comment(
    State(pool): State<SqlitePool>,
    Path(post_id): Path<String>,
    CurrentUser(user): CurrentUser,
    form: Option<Form<CommentForm>>,
) -> AppResult<Response> {
    let post = db::get_post(&pool, parse_post_id(&post_id)?).await?;
    let form = form.map(|Form(form)| form).unwrap_or_default();

    // A rejected comment is shown back on the post page with its errors.
    if let Err(errors) = form.validate() {
        let errors = FormErrors::from(&errors);
        return render_post_detail(&pool, post.id, BoundForm::with_errors(form, errors)).await;
    }

    db::create_comment(&pool, post.id, user.id, form.text.trim()).await?;
    Ok(found(&post_url(post.id)))
}
