use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use crate::{api, cache, AppState};

pub fn generate_routes(state: AppState) -> Router {
    let media = ServeDir::new(state.media.root());
    let upload_limit = state.max_upload_bytes;
    let cached_index = get(api::posts::index).layer(middleware::from_fn_with_state(
        state.page_cache.clone(),
        cache::cache_page,
    ));

    Router::new()
        // ==== FEEDS ==== //
        .route("/", cached_index)
        .route("/group/:slug/", get(api::posts::group_posts))
        .route("/profile/:username/", get(api::posts::profile))
        .route("/follow/", get(api::follow::follow_index))
        // ==== POSTS ==== //
        .route(
            "/create/",
            get(api::posts::new_post)
                .post(api::posts::create_post)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/posts/:post_id/",
            get(api::posts::post_detail).post(api::comments::add_comment),
        )
        .route(
            "/posts/:post_id/edit/",
            get(api::posts::edit_post_form)
                .post(api::posts::edit_post)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        // ==== COMMENTS ==== //
        .route(
            "/posts/:post_id/comment/",
            axum::routing::post(api::comments::add_comment),
        )
        // ==== FOLLOWS ==== //
        .route(
            "/profile/:username/follow/",
            get(api::follow::profile_follow),
        )
        .route(
            "/profile/:username/unfollow/",
            get(api::follow::profile_unfollow),
        )
        // ==== ACCOUNTS ==== //
        .route(
            "/auth/signup/",
            get(api::auth::signup_form).post(api::auth::signup),
        )
        .route(
            "/auth/login/",
            get(api::auth::login_form).post(api::auth::login),
        )
        .route("/auth/logout/", get(api::auth::logout))
        // ==== STATIC ==== //
        .route("/about/author/", get(api::about::author))
        .route("/about/tech/", get(api::about::tech))
        .nest_service("/media", media)
        .fallback(api::handler_404)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new()),
        )
}
