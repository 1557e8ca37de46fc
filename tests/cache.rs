mod common;

use axum::http::{header, StatusCode};
use common::TestApp;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn home_page_is_served_from_cache_until_cleared() {
    let app = TestApp::new().await;
    let user = app.create_user("testuser").await;
    let post_id = app.create_post(&user, "Test post", None).await;
    let session = app.session(&user);

    let first = app.get("/", Some(&session)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.json()["page"]["count"], 1);

    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(post_id)
        .execute(app.pool())
        .await
        .unwrap();

    let second = app.get("/", Some(&session)).await;
    assert_eq!(first.body, second.body);

    app.state.page_cache.clear();

    let third = app.get("/", Some(&session)).await;
    assert_ne!(first.body, third.body);
    assert_eq!(third.json()["page"]["count"], 0);
}

#[tokio::test]
async fn cache_varies_on_cookies_and_query() {
    let app = TestApp::new().await;
    let user = app.create_user("testuser").await;
    app.create_post(&user, "Test post", None).await;

    let anonymous = app.get("/", None).await;
    assert_eq!(anonymous.json()["page"]["count"], 1);

    app.create_post(&user, "Second post", None).await;

    // same cookie state: stale copy
    assert_eq!(app.get("/", None).await.body, anonymous.body);

    // another session or another page: computed fresh
    let logged_in = app.get("/", Some(&app.session(&user))).await;
    assert_eq!(logged_in.json()["page"]["count"], 2);

    let other_page = app.get("/?page=1", None).await;
    assert_eq!(other_page.json()["page"]["count"], 2);
}

#[tokio::test]
async fn cached_responses_advertise_their_lifetime() {
    let app = TestApp::new().await;

    let response = app.get("/", None).await;

    assert_eq!(
        response.headers.get(header::CACHE_CONTROL).unwrap(),
        "max-age=20"
    );
    assert_eq!(response.headers.get(header::VARY).unwrap(), "Cookie");
}

#[tokio::test]
async fn other_feeds_are_not_cached() {
    let app = TestApp::new().await;
    let user = app.create_user("testuser").await;
    let group = app.create_group("Test group", "test_slug").await;
    app.create_post(&user, "Test post", Some(&group)).await;

    let first = app.get("/group/test_slug/", None).await;
    app.create_post(&user, "Second post", Some(&group)).await;
    let second = app.get("/group/test_slug/", None).await;

    assert_eq!(first.json()["page"]["count"], 1);
    assert_eq!(second.json()["page"]["count"], 2);
}
